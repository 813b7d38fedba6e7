mod account;
mod bridge;
mod config;
mod input;
mod logging;
mod render;

use std::{io, process::ExitCode, sync::Arc};

use account::{AccountService, PlatformServices};
use bridge::{ChatBridge, TokioClock};
use chat_core::{
    ChatChannels, ChatCommand, ChatError, ChatRegistry, ChatSession, Clock, ErrorCategory, Notice,
    NoticeLevel, RegistryError, RemoteAction, notice_for_failure,
};
use chat_platform::{
    FileSessionStore, IdentityClaims, InMemoryAvatarUploader, InMemoryChatDirectory,
    InMemoryIdentityProvider,
};
use config::ChatConfig;
use input::{HELP, InputCommand, content_type_for, parse_line};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
};
use tracing::{debug, error, info, warn};

const COMMAND_BUFFER: usize = 64;
const SNAPSHOT_BUFFER: usize = 64;
const DEMO_CREDENTIAL: &str = "demo";

fn main() -> ExitCode {
    logging::init();
    info!("starting quantum-chat");

    let config = match ChatConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "invalid configuration");
            eprintln!("quantum-chat: {err}");
            return ExitCode::FAILURE;
        }
    };
    debug!(?config, "loaded configuration");

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("quantum-chat")
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            error!(error = %err, "failed to start tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(config)) {
        Ok(()) => {
            info!("quantum-chat exiting");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "terminal input failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: ChatConfig) -> io::Result<()> {
    let clock: Arc<dyn Clock> = Arc::new(TokioClock::new());
    let settings = config.session_settings();
    let session = if config.seed {
        ChatSession::seeded(clock, settings)
    } else {
        ChatSession::new(ChatRegistry::default(), clock, settings)
    };

    let (channels, command_rx) = ChatChannels::new(COMMAND_BUFFER, SNAPSHOT_BUFFER);
    let mut snapshots = channels.subscribe();
    let bridge = ChatBridge::spawn(
        session,
        channels,
        command_rx,
        &tokio::runtime::Handle::current(),
    );

    let printer = tokio::spawn(async move {
        loop {
            match snapshots.recv().await {
                Ok(snapshot) => println!("{}", render::render(&snapshot)),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "renderer lagged behind snapshots");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let account = AccountService::new(demo_services(&config));
    if let Some(user) = account.restore() {
        println!("signed in as {}", user.name);
    }
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_line(&line) {
            Ok(InputCommand::Quit) => break,
            Ok(command) => handle(&bridge, &account, command).await,
            Err(err) => println!("{err}"),
        }
    }

    printer.abort();
    Ok(())
}

async fn handle(bridge: &ChatBridge, account: &AccountService, command: InputCommand) {
    match command {
        InputCommand::Chat(command) => forward(bridge, command).await,
        // Applied in order after any queued navigation, so the target is the
        // chat open at that point.
        InputCommand::Say(text) => forward(bridge, ChatCommand::SendToSelected { text }).await,
        InputCommand::Login { credential } => {
            let result = account
                .login(&credential)
                .map(|user| format!("Signed in as {}", user.name));
            report(bridge, RemoteAction::Login, result);
        }
        InputCommand::Logout => {
            let result = account.logout().map(|()| "Signed out".to_owned());
            report(bridge, RemoteAction::Logout, result);
        }
        InputCommand::CreateChat {
            chat_type,
            name,
            member_ids,
        } => {
            let result = account
                .create_chat(&name, chat_type, member_ids)
                .and_then(|chat| {
                    let chat_id = chat.id.clone();
                    let name = chat.name.clone();
                    bridge
                        .update(|session| -> Result<(), RegistryError> {
                            session.add_chat(chat)?;
                            session.select_chat(&chat_id);
                            Ok(())
                        })
                        .map_err(|err| {
                            ChatError::new(
                                ErrorCategory::Internal,
                                "chat_insert_failed",
                                err.to_string(),
                            )
                        })?;
                    Ok(format!("Created {name}"))
                });
            report(bridge, RemoteAction::CreateChat, result);
        }
        InputCommand::UploadAvatar { path } => {
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "failed reading avatar file");
                    print_notices(bridge.notify(Notice::error(format!(
                        "Could not read {}",
                        path.display()
                    ))));
                    return;
                }
            };
            let result = account
                .upload_avatar(&bytes, content_type_for(&path))
                .map(|url| format!("Avatar updated: {url}"));
            report(bridge, RemoteAction::UploadAvatar, result);
        }
        InputCommand::Help => println!("{HELP}"),
        InputCommand::Nothing => {}
        InputCommand::Quit => {}
    }
}

async fn forward(bridge: &ChatBridge, command: ChatCommand) {
    if let Err(err) = bridge.channels().send_command(command).await {
        error!(error = %err, "chat command channel closed");
    }
}

fn report(bridge: &ChatBridge, action: RemoteAction, result: Result<String, ChatError>) {
    let notice = match result {
        Ok(description) => Notice::success(description),
        Err(err) => {
            warn!(?action, error = %err, "remote action failed");
            notice_for_failure(action, &err)
        }
    };
    print_notices(bridge.notify(notice));
}

fn print_notices(notices: Vec<Notice>) {
    for notice in notices {
        let level = match notice.level {
            NoticeLevel::Success => "ok",
            NoticeLevel::Error => "error",
        };
        println!("[{level}] {}: {}", notice.title, notice.description);
    }
}

fn demo_services(config: &ChatConfig) -> PlatformServices {
    let identity = InMemoryIdentityProvider::default();
    if let Err(err) = identity.register_credential(
        DEMO_CREDENTIAL,
        IdentityClaims {
            subject: "demo-user".to_owned(),
            email: "demo@quantum.chat".to_owned(),
            name: "Demo User".to_owned(),
            picture: String::new(),
        },
    ) {
        warn!(error = %err, "failed registering demo credential");
    }

    PlatformServices {
        identity: Arc::new(identity),
        directory: Arc::new(InMemoryChatDirectory::default()),
        avatars: Arc::new(InMemoryAvatarUploader::default()),
        store: Arc::new(FileSessionStore::new(config.session_path.clone())),
    }
}
