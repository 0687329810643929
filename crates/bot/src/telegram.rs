//! Telegram Bot API client
//!
//! Thin JSON client over the HTTP Bot API. Every method posts one payload
//! and unwraps the `{ok, result, description}` envelope. The client also
//! implements the membership gateway: revoke and restore map onto
//! `banChatMember`/`unbanChatMember`, invite links are minted with a member
//! limit of one so each link admits exactly one account.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use gatekeeper_membership::{GroupId, MembershipError, MembershipGateway, MembershipResult};

const TELEGRAM_API: &str = "https://api.telegram.org";

/// Long-poll wait, in seconds, passed to `getUpdates`.
const LONG_POLL_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

/// One incoming update from `getUpdates`.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Deserialize)]
struct ChatInviteLink {
    invite_link: String,
}

/// Bot API client bound to one bot token.
pub struct TelegramClient {
    http: Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(http: Client, token: &str) -> Self {
        Self {
            base_url: format!("{}/bot{}", TELEGRAM_API, token),
            http,
        }
    }

    /// Points the client at a different API host.
    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            http,
        }
    }

    /// Calls one Bot API method and returns the `result` payload.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        payload: &serde_json::Value,
    ) -> MembershipResult<T> {
        let url = format!("{}/{}", self.base_url, method);
        let response = self
            .http
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| MembershipError::Gateway(format!("{} request failed: {}", method, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            return Err(MembershipError::Gateway(format!(
                "{} failed ({}): {}",
                method, status, error_body
            )));
        }

        let envelope: ApiResponse<T> = response.json().await.map_err(|e| {
            MembershipError::Gateway(format!("Malformed {} response: {}", method, e))
        })?;

        if !envelope.ok {
            let description = envelope
                .description
                .unwrap_or_else(|| "no description".to_string());
            return Err(MembershipError::Gateway(format!(
                "{} rejected: {}",
                method, description
            )));
        }

        envelope
            .result
            .ok_or_else(|| MembershipError::Gateway(format!("{} returned no result", method)))
    }

    /// Long-polls for updates past `offset`.
    pub async fn get_updates(&self, offset: i64) -> MembershipResult<Vec<Update>> {
        self.call(
            "getUpdates",
            &json!({
                "offset": offset,
                "timeout": LONG_POLL_TIMEOUT_SECS,
                "allowed_updates": ["message"],
            }),
        )
        .await
    }

    /// Sends a plain-text direct message.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> MembershipResult<()> {
        self.call::<serde_json::Value>(
            "sendMessage",
            &json!({
                "chat_id": chat_id,
                "text": text,
            }),
        )
        .await?;
        Ok(())
    }

    async fn ban_chat_member(&self, chat_id: GroupId, user_id: i64) -> MembershipResult<()> {
        self.call::<bool>(
            "banChatMember",
            &json!({
                "chat_id": chat_id,
                "user_id": user_id,
            }),
        )
        .await?;
        Ok(())
    }

    async fn unban_chat_member(&self, chat_id: GroupId, user_id: i64) -> MembershipResult<()> {
        self.call::<bool>(
            "unbanChatMember",
            &json!({
                "chat_id": chat_id,
                "user_id": user_id,
            }),
        )
        .await?;
        Ok(())
    }

    async fn create_chat_invite_link(
        &self,
        chat_id: GroupId,
        member_limit: u32,
    ) -> MembershipResult<String> {
        let link: ChatInviteLink = self
            .call(
                "createChatInviteLink",
                &json!({
                    "chat_id": chat_id,
                    "member_limit": member_limit,
                }),
            )
            .await?;
        Ok(link.invite_link)
    }
}

#[async_trait]
impl MembershipGateway for TelegramClient {
    /// Bans the member, which removes them from the group.
    async fn revoke(&self, group: GroupId, member_id: i64) -> MembershipResult<()> {
        self.ban_chat_member(group, member_id).await
    }

    /// Lifts the ban so the member can rejoin through a fresh invite.
    async fn restore(&self, group: GroupId, member_id: i64) -> MembershipResult<()> {
        self.unban_chat_member(group, member_id).await
    }

    async fn create_single_use_invite(&self, group: GroupId) -> MembershipResult<String> {
        self.create_chat_invite_link(group, 1).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};

    fn client(server: &ServerGuard) -> TelegramClient {
        TelegramClient::with_base_url(Client::new(), &server.url())
    }

    #[tokio::test]
    async fn test_single_use_invite_sends_member_limit_one() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/createChatInviteLink")
            .match_body(Matcher::Json(json!({
                "chat_id": -100200,
                "member_limit": 1,
            })))
            .with_status(200)
            .with_body(r#"{"ok":true,"result":{"invite_link":"https://t.me/+abc"}}"#)
            .create_async()
            .await;

        let telegram = client(&server);
        let link = telegram.create_single_use_invite(-100200).await.unwrap();

        assert_eq!(link, "https://t.me/+abc");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_revoke_and_restore_hit_the_ban_endpoints() {
        let mut server = Server::new_async().await;
        let ban = server
            .mock("POST", "/banChatMember")
            .match_body(Matcher::Json(json!({"chat_id": -1002, "user_id": 42})))
            .with_status(200)
            .with_body(r#"{"ok":true,"result":true}"#)
            .create_async()
            .await;
        let unban = server
            .mock("POST", "/unbanChatMember")
            .match_body(Matcher::Json(json!({"chat_id": -1002, "user_id": 42})))
            .with_status(200)
            .with_body(r#"{"ok":true,"result":true}"#)
            .create_async()
            .await;

        let telegram = client(&server);
        telegram.revoke(-1002, 42).await.unwrap();
        telegram.restore(-1002, 42).await.unwrap();

        ban.assert_async().await;
        unban.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejected_call_surfaces_the_description() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/banChatMember")
            .with_status(200)
            .with_body(r#"{"ok":false,"description":"Bad Request: user not found"}"#)
            .create_async()
            .await;

        let telegram = client(&server);
        let err = telegram.revoke(-1002, 42).await.unwrap_err();

        let text = err.to_string();
        assert!(text.contains("banChatMember"), "got: {text}");
        assert!(text.contains("user not found"), "got: {text}");
    }

    #[tokio::test]
    async fn test_http_failure_carries_status_and_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/sendMessage")
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let telegram = client(&server);
        let err = telegram.send_message(111, "hi").await.unwrap_err();

        let text = err.to_string();
        assert!(text.contains("502"), "got: {text}");
        assert!(text.contains("bad gateway"), "got: {text}");
    }

    #[tokio::test]
    async fn test_get_updates_decodes_private_messages() {
        let mut server = Server::new_async().await;
        let body = r#"{
            "ok": true,
            "result": [{
                "update_id": 7,
                "message": {
                    "message_id": 1,
                    "from": {"id": 111, "is_bot": false, "first_name": "Ana", "username": "ana"},
                    "chat": {"id": 111, "type": "private"},
                    "text": "/start"
                }
            }]
        }"#;
        let mock = server
            .mock("POST", "/getUpdates")
            .match_body(Matcher::PartialJson(json!({"offset": 5, "timeout": 30})))
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let telegram = client(&server);
        let updates = telegram.get_updates(5).await.unwrap();

        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].update_id, 7);
        let message = updates[0].message.as_ref().unwrap();
        assert_eq!(message.chat.kind, "private");
        assert_eq!(message.text.as_deref(), Some("/start"));
        assert_eq!(message.from.as_ref().unwrap().id, 111);
        assert_eq!(message.from.as_ref().unwrap().username.as_deref(), Some("ana"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_message_posts_chat_and_text() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/sendMessage")
            .match_body(Matcher::Json(json!({"chat_id": 111, "text": "hello"})))
            .with_status(200)
            .with_body(r#"{"ok":true,"result":{"message_id":5}}"#)
            .create_async()
            .await;

        let telegram = client(&server);
        telegram.send_message(111, "hello").await.unwrap();

        mock.assert_async().await;
    }
}
