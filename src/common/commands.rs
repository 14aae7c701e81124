const SEARCH_PREFIX: &str = "/search ";
const USER_PREFIX: &str = "/user ";

/// Một dòng client gửi lên, đã được phân loại.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    Exit,
    /// Tìm theo nội dung tin nhắn.
    SearchKeyword(String),
    /// Tìm theo tên người gửi.
    SearchUser(String),
    /// Mọi dòng còn lại, kể cả dòng rỗng và lệnh lạ.
    Chat(String),
}

impl ClientCommand {
    pub fn parse(line: &str) -> Self {
        if line == "exit" {
            Self::Exit
        } else if let Some(query) = line.strip_prefix(SEARCH_PREFIX) {
            Self::SearchKeyword(query.to_string())
        } else if let Some(query) = line.strip_prefix(USER_PREFIX) {
            Self::SearchUser(query.to_string())
        } else {
            Self::Chat(line.to_string())
        }
    }
}
