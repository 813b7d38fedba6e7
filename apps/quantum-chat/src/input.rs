//! Line-oriented input for the terminal front end.
//!
//! Plain text is sent to the open chat; lines starting with `/` are commands.

use std::path::PathBuf;

use chat_core::ChatCommand;
use chat_platform::ChatType;
use thiserror::Error;

pub const HELP: &str = "\
commands:
  /open <chat-id>            open a chat
  /back                      return to the chat list (narrow layout)
  /send <chat-id> <text>     send to a specific chat
  /delete <chat-id>          remove a chat
  /resize <width-px>         simulate a viewport width
  /search [query]            filter chats by name (empty clears)
  /theme                     toggle light/dark
  /login <token>             sign in
  /logout                    sign out
  /create group|channel <name> [member-id ...]
  /avatar <image-path>       upload a new avatar
  /help                      show this help
  /quit                      exit
anything else is sent to the open chat";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    /// Forwarded to the session as-is.
    Chat(ChatCommand),
    /// Text for whichever chat is open.
    Say(String),
    Login { credential: String },
    Logout,
    CreateChat {
        chat_type: ChatType,
        name: String,
        member_ids: Vec<u64>,
    },
    UploadAvatar { path: PathBuf },
    Help,
    Quit,
    /// Blank line; nothing to do.
    Nothing,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("unknown command '/{0}' (try /help)")]
    UnknownCommand(String),
    #[error("/{command} needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
    #[error("'{value}' is not a valid {what}")]
    InvalidNumber { value: String, what: &'static str },
    #[error("chat type must be 'group' or 'channel', got '{0}'")]
    InvalidChatType(String),
}

pub fn parse_line(line: &str) -> Result<InputCommand, InputError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let Some(rest) = line.trim_start().strip_prefix('/') else {
        if line.trim().is_empty() {
            return Ok(InputCommand::Nothing);
        }
        return Ok(InputCommand::Say(line.to_owned()));
    };

    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };

    match name {
        "open" => {
            let chat_id = required(args, "open", "a chat id")?;
            Ok(InputCommand::Chat(ChatCommand::SelectChat {
                chat_id: chat_id.to_owned(),
            }))
        }
        "back" => Ok(InputCommand::Chat(ChatCommand::Back)),
        "send" => {
            let (chat_id, text) = args.split_once(char::is_whitespace).ok_or(
                InputError::MissingArgument {
                    command: "send",
                    argument: "a chat id and text",
                },
            )?;
            Ok(InputCommand::Chat(ChatCommand::SendMessage {
                chat_id: chat_id.to_owned(),
                text: text.trim_start().to_owned(),
            }))
        }
        "delete" => {
            let chat_id = required(args, "delete", "a chat id")?;
            Ok(InputCommand::Chat(ChatCommand::RemoveChat {
                chat_id: chat_id.to_owned(),
            }))
        }
        "resize" => {
            let value = required(args, "resize", "a width in pixels")?;
            let width_px = value.parse::<u32>().map_err(|_| InputError::InvalidNumber {
                value: value.to_owned(),
                what: "width",
            })?;
            Ok(InputCommand::Chat(ChatCommand::Resize { width_px }))
        }
        "search" => Ok(InputCommand::Chat(ChatCommand::SetSearchQuery {
            query: args.to_owned(),
        })),
        "theme" => Ok(InputCommand::Chat(ChatCommand::ToggleTheme)),
        "login" => {
            let credential = required(args, "login", "a token")?;
            Ok(InputCommand::Login {
                credential: credential.to_owned(),
            })
        }
        "logout" => Ok(InputCommand::Logout),
        "create" => parse_create(args),
        "avatar" => {
            let path = required(args, "avatar", "an image path")?;
            Ok(InputCommand::UploadAvatar {
                path: PathBuf::from(path),
            })
        }
        "help" | "?" => Ok(InputCommand::Help),
        "quit" | "exit" => Ok(InputCommand::Quit),
        other => Err(InputError::UnknownCommand(other.to_owned())),
    }
}

fn parse_create(args: &str) -> Result<InputCommand, InputError> {
    let mut words = args.split_whitespace();
    let kind = words.next().ok_or(InputError::MissingArgument {
        command: "create",
        argument: "a chat type and name",
    })?;
    let chat_type = match kind.to_ascii_lowercase().as_str() {
        "group" => ChatType::Group,
        "channel" => ChatType::Channel,
        _ => return Err(InputError::InvalidChatType(kind.to_owned())),
    };

    // Trailing numeric words are member IDs; the rest is the name.
    let mut words: Vec<&str> = words.collect();
    let mut member_ids = Vec::new();
    while let Some(last) = words.last()
        && let Ok(id) = last.parse::<u64>()
    {
        member_ids.push(id);
        words.pop();
    }
    member_ids.reverse();

    // Blank names are passed through so the account flow reports them.
    Ok(InputCommand::CreateChat {
        chat_type,
        name: words.join(" "),
        member_ids,
    })
}

fn required<'a>(
    args: &'a str,
    command: &'static str,
    argument: &'static str,
) -> Result<&'a str, InputError> {
    if args.is_empty() {
        return Err(InputError::MissingArgument { command, argument });
    }
    Ok(args)
}

/// Content type inferred from a file extension.
pub fn content_type_for(path: &std::path::Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn plain_text_is_said_verbatim() {
        assert_eq!(
            parse_line("  hello there \n").expect("parse"),
            InputCommand::Say("  hello there ".to_owned())
        );
        assert_eq!(parse_line("   ").expect("parse"), InputCommand::Nothing);
    }

    #[test]
    fn parses_navigation_commands() {
        assert_eq!(
            parse_line("/open 2").expect("parse"),
            InputCommand::Chat(ChatCommand::SelectChat {
                chat_id: "2".to_owned()
            })
        );
        assert_eq!(
            parse_line("/back").expect("parse"),
            InputCommand::Chat(ChatCommand::Back)
        );
        assert_eq!(
            parse_line("/delete 4").expect("parse"),
            InputCommand::Chat(ChatCommand::RemoveChat {
                chat_id: "4".to_owned()
            })
        );
        assert_eq!(
            parse_line("/resize 390").expect("parse"),
            InputCommand::Chat(ChatCommand::Resize { width_px: 390 })
        );
        assert_eq!(
            parse_line("/search").expect("parse"),
            InputCommand::Chat(ChatCommand::SetSearchQuery {
                query: String::new()
            })
        );
    }

    #[test]
    fn send_keeps_text_after_chat_id() {
        assert_eq!(
            parse_line("/send 3 see you  at 5").expect("parse"),
            InputCommand::Chat(ChatCommand::SendMessage {
                chat_id: "3".to_owned(),
                text: "see you  at 5".to_owned(),
            })
        );
        assert!(matches!(
            parse_line("/send 3"),
            Err(InputError::MissingArgument { command: "send", .. })
        ));
    }

    #[test]
    fn create_splits_trailing_member_ids() {
        assert_eq!(
            parse_line("/create group Weekend trip 2 3").expect("parse"),
            InputCommand::CreateChat {
                chat_type: ChatType::Group,
                name: "Weekend trip".to_owned(),
                member_ids: vec![2, 3],
            }
        );
        assert_eq!(
            parse_line("/create channel").expect("parse"),
            InputCommand::CreateChat {
                chat_type: ChatType::Channel,
                name: String::new(),
                member_ids: vec![],
            }
        );
        assert_eq!(
            parse_line("/create forum x"),
            Err(InputError::InvalidChatType("forum".to_owned()))
        );
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(
            parse_line("/resize wide"),
            Err(InputError::InvalidNumber {
                value: "wide".to_owned(),
                what: "width"
            })
        );
        assert_eq!(
            parse_line("/dance"),
            Err(InputError::UnknownCommand("dance".to_owned()))
        );
        assert!(parse_line("/open").is_err());
    }

    #[test]
    fn guesses_image_content_types() {
        assert_eq!(content_type_for(Path::new("me.JPG")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("cv.pdf")), "application/octet-stream");
    }
}
