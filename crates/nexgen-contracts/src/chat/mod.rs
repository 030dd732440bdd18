mod command_registry;
mod intent_parser;

pub use command_registry::HELP_LINES;
pub use intent_parser::{parse_chat_input, ChatAction, ChatIntent};
