#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct UserId(pub i64);

impl UserId {
    pub fn stub() -> UserId {
        UserId(0)
    }
}

/// Identity of the person reading or writing comments, as resolved by the
/// host environment. Never persisted into a bucket.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct UserInfo {
    pub id: UserId,
    pub display_name: String,
    pub email: String,
    pub avatar_url: String,
}

impl UserInfo {
    pub fn stub() -> UserInfo {
        UserInfo {
            id: UserId::stub(),
            display_name: String::from("stub"),
            email: String::new(),
            avatar_url: String::new(),
        }
    }
}
