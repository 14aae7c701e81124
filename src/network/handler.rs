use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::chat::ChatManager;
use crate::common::{ClientCommand, ConnectionId, Message, User};
use crate::storage::SearchField;

use super::outbound::Outbound;

const NAME_PROMPT: &str = "Enter your name: ";
const INPUT_PROMPT: &str = "> ";
const NO_RESULTS: &str = "No results found.";
/// Dòng dài hơn giới hạn này bị cắt thành nhiều dòng.
pub const MAX_LINE_BYTES: u64 = 64 * 1024;
const HELP_LINES: [&str; 5] = [
    "Commands available:",
    "- Type 'exit' to leave",
    "- Type '/search <query>' to search by keyword",
    "- Type '/user <username>' to search by user",
    "- Type any other message to chat",
];

/// Vòng đời của một kết nối.
#[derive(Debug)]
enum HandlerState {
    Connecting,
    Active(User),
    Closing(User),
    Closed,
}

/// Điều khiển một client: đăng ký tên, vòng lặp tin nhắn, rời phòng.
pub struct ConnectionHandler<R> {
    manager: Arc<ChatManager>,
    connection: ConnectionId,
    peer_id: String,
    reader: R,
    outbound: Outbound,
}

impl<R> ConnectionHandler<R>
where
    R: AsyncBufRead + Unpin,
{
    pub fn new(
        manager: Arc<ChatManager>,
        peer_id: impl Into<String>,
        reader: R,
        outbound: Outbound,
    ) -> Self {
        Self {
            manager,
            connection: ConnectionId::new(),
            peer_id: peer_id.into(),
            reader,
            outbound,
        }
    }

    /// Chạy tới khi client thoát hoặc mất kết nối. Khi trả về, handler
    /// bị drop cùng `Outbound`, writer task tự đóng socket.
    pub async fn run(mut self) {
        let mut state = HandlerState::Connecting;
        loop {
            state = match state {
                HandlerState::Connecting => self.connect().await,
                HandlerState::Active(user) => self.serve(user).await,
                HandlerState::Closing(user) => self.close(user),
                HandlerState::Closed => break,
            };
            log::debug!("Connection {} -> {:?}", self.connection, state);
        }
    }

    async fn connect(&mut self) -> HandlerState {
        self.write_raw(NAME_PROMPT);
        let Some(name) = self.read_line().await else {
            log::info!("{} disconnected before choosing a name", self.peer_id);
            return HandlerState::Closed;
        };

        let user = self.manager.register_user(
            &self.peer_id,
            &name,
            self.connection,
            self.outbound.clone(),
        );

        for line in HELP_LINES {
            self.write_line(line);
        }

        HandlerState::Active(user)
    }

    async fn serve(&mut self, user: User) -> HandlerState {
        log::info!("{} joined from {}", user.name, user.id);
        self.manager.broadcast_message(&Message::joined(&user));

        loop {
            self.write_raw(INPUT_PROMPT);
            let Some(line) = self.read_line().await else {
                return HandlerState::Closing(user);
            };

            match ClientCommand::parse(&line) {
                ClientCommand::Exit => return HandlerState::Closing(user),
                ClientCommand::SearchKeyword(query) => {
                    self.reply_search(&query, SearchField::Content);
                }
                ClientCommand::SearchUser(query) => {
                    self.reply_search(&query, SearchField::Sender);
                }
                ClientCommand::Chat(content) => {
                    let msg = Message::new(user.name.clone(), content);
                    self.manager.store_message(msg.clone());
                    self.manager.broadcast_message(&msg);
                }
            }
        }
    }

    fn close(&mut self, user: User) -> HandlerState {
        self.manager.remove_user(&self.connection);
        self.manager.broadcast_message(&Message::left(&user));
        log::info!("{} left ({})", user.name, user.id);
        HandlerState::Closed
    }

    fn reply_search(&self, query: &str, field: SearchField) {
        let results = self.manager.search_messages(query, field);
        if results.is_empty() {
            self.write_line(NO_RESULTS);
            return;
        }

        self.write_line(match field {
            SearchField::Content => "Search results by keyword:",
            SearchField::Sender => "Search results by user:",
        });
        for result in &results {
            self.write_line(result);
        }
    }

    /// `None` khi hết stream hoặc lỗi transport. Byte không phải UTF-8
    /// được thay bằng U+FFFD, không làm đóng phiên.
    async fn read_line(&mut self) -> Option<String> {
        let mut buf = Vec::new();
        let mut limited = (&mut self.reader).take(MAX_LINE_BYTES);
        match limited.read_until(b'\n', &mut buf).await {
            Ok(0) => None,
            Ok(_) => {
                if buf.last() == Some(&b'\n') {
                    buf.pop();
                    if buf.last() == Some(&b'\r') {
                        buf.pop();
                    }
                }
                Some(String::from_utf8_lossy(&buf).into_owned())
            }
            Err(err) => {
                log::warn!("Read error from {}: {err}", self.peer_id);
                None
            }
        }
    }

    fn write_raw(&self, text: &str) {
        if let Err(err) = self.outbound.send_raw(text) {
            log::debug!("Dropping output for {}: {err}", self.peer_id);
        }
    }

    fn write_line(&self, line: &str) {
        if let Err(err) = self.outbound.send_line(line) {
            log::debug!("Dropping output for {}: {err}", self.peer_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use tokio::io::{AsyncWriteExt, BufReader};

    use super::*;
    use crate::network::OutboundReceiver;

    fn collect(receiver: &mut OutboundReceiver) -> String {
        let mut out = String::new();
        while let Ok(chunk) = receiver.try_recv() {
            out.push_str(&chunk);
        }
        out
    }

    async fn run_with_input(manager: Arc<ChatManager>, input: &str) -> String {
        run_with_bytes(manager, input.as_bytes().to_vec()).await
    }

    async fn run_with_bytes(manager: Arc<ChatManager>, input: Vec<u8>) -> String {
        let (mut client, server) = tokio::io::duplex(4096);
        tokio::spawn(async move {
            client.write_all(&input).await.unwrap();
            client.shutdown().await.unwrap();
        });

        let (outbound, mut receiver) = Outbound::channel();
        ConnectionHandler::new(manager, "127.0.0.1:9000", BufReader::new(server), outbound)
            .run()
            .await;
        collect(&mut receiver)
    }

    #[tokio::test]
    async fn full_session_lifecycle() {
        let manager = Arc::new(ChatManager::new());
        let output = run_with_input(
            Arc::clone(&manager),
            "alice\nhello world\n/search hello\n/user nobody\nexit\n",
        )
        .await;

        assert!(output.starts_with("Enter your name: Commands available:\n"));
        assert!(output.contains("alice: alice has joined.\n"));
        assert!(output.contains("Search results by keyword:\n"));
        assert!(output.contains("alice: hello world\n"));
        assert!(output.contains("No results found.\n"));
        // the leaver is deregistered before the leave notice goes out
        assert!(!output.contains("has left."));

        let stats = manager.stats();
        assert_eq!(stats.sessions, 0);
        assert_eq!(stats.messages, 1);
    }

    #[tokio::test]
    async fn end_of_stream_behaves_like_exit() {
        let manager = Arc::new(ChatManager::new());
        let (watcher, mut watcher_rx) = Outbound::channel();
        manager.register_user("127.0.0.1:1", "watcher", ConnectionId::new(), watcher);

        run_with_input(Arc::clone(&manager), "bob\r\nbye\r\n").await;

        let seen = collect(&mut watcher_rx);
        assert!(seen.contains("bob: bob has joined.\n"));
        assert!(seen.contains("bob: bye\n"));
        assert!(seen.contains("bob: bob has left.\n"));
        assert_eq!(manager.stats().sessions, 1);
    }

    #[tokio::test]
    async fn disconnect_before_name_never_registers() {
        let manager = Arc::new(ChatManager::new());
        let (watcher, mut watcher_rx) = Outbound::channel();
        manager.register_user("127.0.0.1:1", "watcher", ConnectionId::new(), watcher);

        let output = run_with_input(Arc::clone(&manager), "").await;

        assert_eq!(output, "Enter your name: ");
        assert!(collect(&mut watcher_rx).is_empty());
        assert_eq!(manager.stats().sessions, 1);
    }

    #[tokio::test]
    async fn empty_line_is_stored_as_chat() {
        let manager = Arc::new(ChatManager::new());
        run_with_input(Arc::clone(&manager), "carol\n\nexit\n").await;

        let results = manager.search_messages("carol", SearchField::Sender);
        assert_eq!(results.len(), 1);
        assert!(results[0].ends_with("carol: "));
    }

    #[tokio::test]
    async fn invalid_utf8_line_is_chat_not_disconnect() {
        let manager = Arc::new(ChatManager::new());
        let (watcher, mut watcher_rx) = Outbound::channel();
        manager.register_user("127.0.0.1:1", "watcher", ConnectionId::new(), watcher);

        run_with_bytes(
            Arc::clone(&manager),
            b"eve\ncaf\xe9 au lait\nstill here\nexit\n".to_vec(),
        )
        .await;

        let seen = collect(&mut watcher_rx);
        assert!(seen.contains("eve: caf\u{FFFD} au lait\n"));
        assert!(seen.contains("eve: still here\n"));
        assert_eq!(seen.matches("has left.").count(), 1);
        assert_eq!(manager.stats().messages, 2);
        assert_eq!(manager.search_messages("au lait", SearchField::Content).len(), 1);
    }

    #[tokio::test]
    async fn overlong_line_is_split_at_the_limit() {
        let manager = Arc::new(ChatManager::new());
        let limit = MAX_LINE_BYTES as usize;
        let mut input = b"gus\n".to_vec();
        input.extend(std::iter::repeat_n(b'x', limit + 10));
        input.extend_from_slice(b"\nexit\n");

        run_with_bytes(Arc::clone(&manager), input).await;

        let stored = manager.search_messages("x", SearchField::Content);
        assert_eq!(stored.len(), 2);
        assert!(stored[0].ends_with(&format!("gus: {}", "x".repeat(limit))));
        assert!(stored[1].ends_with(&format!("gus: {}", "x".repeat(10))));
        assert_eq!(manager.stats().sessions, 0);
    }

    #[tokio::test]
    async fn read_error_closes_like_exit() {
        let manager = Arc::new(ChatManager::new());
        let (watcher, mut watcher_rx) = Outbound::channel();
        manager.register_user("127.0.0.1:1", "watcher", ConnectionId::new(), watcher);

        let reader = tokio_test::io::Builder::new()
            .read(b"frank\nhello\n")
            .read_error(io::Error::new(io::ErrorKind::ConnectionReset, "peer reset"))
            .build();
        let (outbound, _receiver) = Outbound::channel();
        ConnectionHandler::new(
            Arc::clone(&manager),
            "127.0.0.1:9002",
            BufReader::new(reader),
            outbound,
        )
        .run()
        .await;

        let seen = collect(&mut watcher_rx);
        assert!(seen.contains("frank: hello\n"));
        assert!(seen.contains("frank: frank has left.\n"));
        assert_eq!(manager.stats().sessions, 1);
        assert_eq!(manager.stats().messages, 1);
    }

    #[tokio::test]
    async fn closed_output_does_not_stop_the_handler() {
        let manager = Arc::new(ChatManager::new());
        let (mut client, server) = tokio::io::duplex(1024);
        client.write_all(b"dave\nstill typing\nexit\n").await.unwrap();
        client.shutdown().await.unwrap();

        let (outbound, receiver) = Outbound::channel();
        drop(receiver);
        ConnectionHandler::new(
            Arc::clone(&manager),
            "127.0.0.1:9001",
            BufReader::new(server),
            outbound,
        )
        .run()
        .await;

        assert_eq!(manager.search_messages("still", SearchField::Content).len(), 1);
        assert_eq!(manager.stats().sessions, 0);
    }
}
