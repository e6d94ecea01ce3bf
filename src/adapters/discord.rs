//! Discord wire shapes for interactions, plus the REST user lookup.
//!
//! Only the fields this bot reads are modelled; everything else in the
//! payload is ignored by serde.

use crate::app::action::{AutocompleteRequest, Caller, Invocation, OptionValue};
use crate::app::reply::Reply;
use crate::app::surface::CommandSurface;
use crate::domain::ports::{Storage, UserNameResolver};
use crate::utils::error::{LedgerError, Result};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const PING: u8 = 1;
pub const APPLICATION_COMMAND: u8 = 2;
pub const APPLICATION_COMMAND_AUTOCOMPLETE: u8 = 4;

const OPTION_STRING: u8 = 3;
const OPTION_INTEGER: u8 = 4;
const OPTION_NUMBER: u8 = 10;

const RESPONSE_PONG: u8 = 1;
const RESPONSE_CHANNEL_MESSAGE: u8 = 4;
const RESPONSE_AUTOCOMPLETE: u8 = 8;

/// Message flag that limits visibility to the invoking user.
pub const EPHEMERAL: u64 = 1 << 6;

#[derive(Debug, Clone, Deserialize)]
pub struct Interaction {
    #[serde(rename = "type")]
    pub kind: u8,
    pub data: Option<InteractionData>,
    /// Present for guild interactions.
    pub member: Option<Member>,
    /// Present for direct-message interactions.
    pub user: Option<User>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InteractionData {
    pub name: String,
    #[serde(default)]
    pub options: Vec<InteractionOption>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InteractionOption {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: u8,
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub focused: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Member {
    pub user: User,
    /// Resolved permission bitfield, serialized as a decimal string.
    pub permissions: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
}

impl User {
    pub fn display_name(&self) -> &str {
        self.global_name.as_deref().unwrap_or(&self.username)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InboundRequest {
    Ping,
    Command { caller: Caller, invocation: Invocation },
    Autocomplete(AutocompleteRequest),
}

fn malformed(message: impl Into<String>) -> LedgerError {
    LedgerError::InvalidCommand {
        message: message.into(),
    }
}

impl Interaction {
    pub fn from_json(payload: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(payload)?)
    }

    /// Only guild members can be administrators; DMs never are.
    pub fn caller(&self) -> Result<Caller> {
        if let Some(member) = &self.member {
            let permissions = match member.permissions.as_deref() {
                Some(bits) => bits
                    .parse::<u64>()
                    .map_err(|_| malformed(format!("bad permission bitfield '{}'", bits)))?,
                None => 0,
            };
            return Ok(Caller::from_permissions(
                member.user.id.clone(),
                member.user.display_name(),
                permissions,
            ));
        }

        let user = self
            .user
            .as_ref()
            .ok_or_else(|| malformed("interaction has neither member nor user"))?;
        Ok(Caller::new(user.id.clone(), user.display_name(), false))
    }

    pub fn into_request(self) -> Result<InboundRequest> {
        match self.kind {
            PING => Ok(InboundRequest::Ping),
            APPLICATION_COMMAND => {
                let caller = self.caller()?;
                let data = self
                    .data
                    .ok_or_else(|| malformed("command interaction without data"))?;
                let mut invocation = Invocation::new(data.name);
                for option in data.options {
                    let value = option_value(&option)?;
                    invocation.options.push((option.name, value));
                }
                Ok(InboundRequest::Command { caller, invocation })
            }
            APPLICATION_COMMAND_AUTOCOMPLETE => {
                let data = self
                    .data
                    .ok_or_else(|| malformed("autocomplete interaction without data"))?;
                let focused = data
                    .options
                    .into_iter()
                    .find(|o| o.focused)
                    .ok_or_else(|| malformed("autocomplete interaction without a focused option"))?;
                let partial = match &focused.value {
                    Some(serde_json::Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                    None => String::new(),
                };
                Ok(InboundRequest::Autocomplete(AutocompleteRequest {
                    command: data.name,
                    option: focused.name,
                    partial,
                }))
            }
            other => Err(malformed(format!("unsupported interaction type {}", other))),
        }
    }
}

fn option_value(option: &InteractionOption) -> Result<OptionValue> {
    let value = option
        .value
        .as_ref()
        .ok_or_else(|| malformed(format!("option '{}' has no value", option.name)))?;

    match option.kind {
        OPTION_STRING => value
            .as_str()
            .map(|s| OptionValue::String(s.to_string()))
            .ok_or_else(|| malformed(format!("option '{}' is not a string", option.name))),
        OPTION_INTEGER | OPTION_NUMBER => value
            .as_f64()
            .map(OptionValue::Number)
            .ok_or_else(|| malformed(format!("option '{}' is not a number", option.name))),
        other => Err(malformed(format!(
            "option '{}' has unsupported type {}",
            option.name, other
        ))),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ResponseData {
    Message(MessageData),
    Autocomplete(AutocompleteData),
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<EmbedPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedPayload {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub color: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldPayload>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldPayload {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AutocompleteData {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Choice {
    pub name: String,
    pub value: String,
}

impl InteractionResponse {
    pub fn pong() -> Self {
        Self {
            kind: RESPONSE_PONG,
            data: None,
        }
    }

    pub fn message(reply: &Reply) -> Self {
        let embeds = reply
            .embed
            .iter()
            .map(|embed| EmbedPayload {
                title: embed.title.clone(),
                description: embed.description.clone(),
                color: embed.color.rgb(),
                fields: embed
                    .fields
                    .iter()
                    .map(|f| FieldPayload {
                        name: f.name.clone(),
                        value: f.value.clone(),
                        inline: f.inline,
                    })
                    .collect(),
            })
            .collect();

        Self {
            kind: RESPONSE_CHANNEL_MESSAGE,
            data: Some(ResponseData::Message(MessageData {
                content: reply.content.clone(),
                embeds,
                flags: reply.ephemeral.then_some(EPHEMERAL),
            })),
        }
    }

    pub fn autocomplete(titles: Vec<String>) -> Self {
        let choices = titles
            .into_iter()
            .map(|title| Choice {
                name: title.clone(),
                value: title,
            })
            .collect();

        Self {
            kind: RESPONSE_AUTOCOMPLETE,
            data: Some(ResponseData::Autocomplete(AutocompleteData { choices })),
        }
    }
}

/// Parses a raw interaction payload, runs it and builds the response body.
pub async fn dispatch<S: Storage>(
    surface: &CommandSurface<S>,
    payload: &[u8],
) -> Result<InteractionResponse> {
    match Interaction::from_json(payload)?.into_request()? {
        InboundRequest::Ping => Ok(InteractionResponse::pong()),
        InboundRequest::Command { caller, invocation } => {
            let reply = surface.handle(&caller, &invocation).await;
            Ok(InteractionResponse::message(&reply))
        }
        InboundRequest::Autocomplete(request) => {
            // A failed lookup should not surface as an error popup while typing.
            let titles = surface.autocomplete(&request).await.unwrap_or_else(|e| {
                tracing::debug!(error = %e, "Autocomplete request refused");
                Vec::new()
            });
            Ok(InteractionResponse::autocomplete(titles))
        }
    }
}

/// Looks users up through `GET /users/{id}` with the bot token.
pub struct DiscordUserResolver {
    client: Client,
    api_base: String,
    token: String,
}

impl DiscordUserResolver {
    pub fn new(api_base: impl Into<String>, token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("title-ratings/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }
}

#[async_trait]
impl UserNameResolver for DiscordUserResolver {
    async fn resolve(&self, user_id: &str) -> Result<String> {
        if user_id.is_empty() || !user_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(LedgerError::InvalidUserId {
                user_id: user_id.to_string(),
            });
        }

        let url = format!("{}/users/{}", self.api_base, user_id);
        tracing::debug!("Resolving user name via {}", url);

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, format!("Bot {}", self.token))
            .send()
            .await?;

        tracing::debug!("User lookup status: {}", response.status());

        let user: User = response.error_for_status()?.json().await?;
        Ok(user.display_name().to_string())
    }
}
