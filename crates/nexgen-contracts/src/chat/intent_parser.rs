use super::command_registry::{CommandSpec, NO_ARG_COMMANDS, SINGLE_PATH_COMMANDS, TOGGLE_COMMANDS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatAction {
    Noop,
    Message,
    AttachImage,
    DetachImage,
    SetWebSearch,
    SetLeadCapture,
    ShowHistory,
    ClearConversation,
    Help,
    Quit,
    Unknown,
}

/// One line of REPL input, classified.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatIntent {
    pub action: ChatAction,
    pub raw: String,
    pub message: Option<String>,
    pub path: Option<String>,
    pub enabled: Option<bool>,
    pub command: Option<String>,
}

impl ChatIntent {
    fn new(action: ChatAction, raw: &str) -> Self {
        Self {
            action,
            raw: raw.to_string(),
            message: None,
            path: None,
            enabled: None,
            command: None,
        }
    }
}

fn find_action(command: &str, specs: &[CommandSpec]) -> Option<ChatAction> {
    specs
        .iter()
        .find(|spec| spec.command == command)
        .map(|spec| spec.action)
}

fn parse_path_args(arg: &str) -> Vec<String> {
    if arg.trim().is_empty() {
        return Vec::new();
    }
    match shell_words::split(arg) {
        Ok(parts) => parts
            .into_iter()
            .filter(|value| !value.is_empty())
            .collect(),
        Err(_) => arg.split_whitespace().map(str::to_string).collect(),
    }
}

fn parse_single_path_arg(arg: &str) -> String {
    parse_path_args(arg).join(" ")
}

fn parse_toggle(arg: &str) -> Option<bool> {
    match arg.trim().to_ascii_lowercase().as_str() {
        "" | "on" | "true" | "sim" | "1" => Some(true),
        "off" | "false" | "nao" | "não" | "0" => Some(false),
        _ => None,
    }
}

pub fn parse_chat_input(text: &str) -> ChatIntent {
    let raw_trimmed = text.trim();
    if raw_trimmed.is_empty() {
        return ChatIntent::new(ChatAction::Noop, text);
    }

    if let Some(slash_tail) = raw_trimmed.strip_prefix('/') {
        let command_len = slash_tail
            .chars()
            .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
            .count();
        if command_len > 0 {
            let command = slash_tail[..command_len].to_ascii_lowercase();
            let arg = slash_tail[command_len..].trim();

            if let Some(action) = find_action(&command, SINGLE_PATH_COMMANDS) {
                let path = parse_single_path_arg(arg);
                let mut intent = ChatIntent::new(action, text);
                intent.path = (!path.is_empty()).then_some(path);
                return intent;
            }

            if let Some(action) = find_action(&command, TOGGLE_COMMANDS) {
                if let Some(enabled) = parse_toggle(arg) {
                    let mut intent = ChatIntent::new(action, text);
                    intent.enabled = Some(enabled);
                    return intent;
                }
            } else if let Some(action) = find_action(&command, NO_ARG_COMMANDS) {
                return ChatIntent::new(action, text);
            }

            let mut intent = ChatIntent::new(ChatAction::Unknown, text);
            intent.command = Some(command);
            return intent;
        }
    }

    let mut intent = ChatIntent::new(ChatAction::Message, text);
    intent.message = Some(raw_trimmed.to_string());
    intent
}
