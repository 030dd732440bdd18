use super::intent_parser::ChatAction;

#[derive(Clone, Copy, Debug)]
pub(crate) struct CommandSpec {
    pub command: &'static str,
    pub action: ChatAction,
}

pub(crate) const SINGLE_PATH_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "image",
        action: ChatAction::AttachImage,
    },
    CommandSpec {
        command: "foto",
        action: ChatAction::AttachImage,
    },
];

pub(crate) const TOGGLE_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "search",
        action: ChatAction::SetWebSearch,
    },
    CommandSpec {
        command: "capture",
        action: ChatAction::SetLeadCapture,
    },
];

pub(crate) const NO_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "detach",
        action: ChatAction::DetachImage,
    },
    CommandSpec {
        command: "history",
        action: ChatAction::ShowHistory,
    },
    CommandSpec {
        command: "clear",
        action: ChatAction::ClearConversation,
    },
    CommandSpec {
        command: "help",
        action: ChatAction::Help,
    },
    CommandSpec {
        command: "quit",
        action: ChatAction::Quit,
    },
    CommandSpec {
        command: "exit",
        action: ChatAction::Quit,
    },
];

pub const HELP_LINES: &[&str] = &[
    "/image <caminho>   anexa uma imagem à próxima mensagem",
    "/detach            remove a imagem anexada",
    "/search on|off     pesquisa web nas respostas",
    "/capture on|off    registo automático de contactos",
    "/history           mostra a conversa",
    "/clear             começa uma conversa nova",
    "/quit              sair",
];
