use log::{debug, info, warn};

use crate::config::ConfigStore;
use crate::error::StoreError;
use crate::types::PrivilegeContext;

/// Prefix that marks a chat message as a command
pub const COMMAND_PREFIX: &str = "!";

/// Reply sent whenever a change could not be written to disk
pub const SAVE_FAILED_REPLY: &str = "Failed to save configuration";

/// Administrative commands that manage trigger words and spam patterns
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    AddResponse { trigger: String, response: String },
    DelResponse { trigger: String },
    Responses,
    AddSpam { pattern: String },
    DelSpam { pattern: String },
    SpamPatterns,
}

/// A recognised command name with missing arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage(pub &'static str);

/// Split "!name rest of line" into a lowercase command name and its raw
/// arguments. Returns `None` when the content does not start with `prefix`
/// or has no command name.
pub fn split_command<'a>(content: &'a str, prefix: &str) -> Option<(String, &'a str)> {
    let without_prefix = content.strip_prefix(prefix)?;
    let without_prefix = without_prefix.trim_start();

    let (name, args) = match without_prefix.find(char::is_whitespace) {
        Some(end) => (&without_prefix[..end], without_prefix[end..].trim()),
        None => (without_prefix, ""),
    };

    if name.is_empty() {
        return None;
    }

    Some((name.to_lowercase(), args))
}

impl AdminCommand {
    /// Parse a command by name. `Ok(None)` means the name is not an admin command.
    pub fn parse(name: &str, args: &str) -> Result<Option<Self>, Usage> {
        let args = args.trim();

        let command = match name {
            "addresponse" => {
                let (trigger, response) = args
                    .split_once(char::is_whitespace)
                    .map(|(trigger, response)| (trigger, response.trim()))
                    .filter(|(_, response)| !response.is_empty())
                    .ok_or(Usage("Usage: !addresponse <trigger> <response text>"))?;

                AdminCommand::AddResponse {
                    trigger: trigger.to_string(),
                    response: response.to_string(),
                }
            }
            "delresponse" => {
                let trigger = args
                    .split_whitespace()
                    .next()
                    .ok_or(Usage("Usage: !delresponse <trigger>"))?;

                AdminCommand::DelResponse {
                    trigger: trigger.to_string(),
                }
            }
            "responses" => AdminCommand::Responses,
            "addspam" => AdminCommand::AddSpam {
                pattern: pattern_argument(args).ok_or(Usage("Usage: !addspam <pattern>"))?,
            },
            "delspam" => AdminCommand::DelSpam {
                pattern: pattern_argument(args).ok_or(Usage("Usage: !delspam <pattern>"))?,
            },
            "spampatterns" => AdminCommand::SpamPatterns,
            _ => return Ok(None),
        };

        Ok(Some(command))
    }

    pub fn name(&self) -> &'static str {
        match self {
            AdminCommand::AddResponse { .. } => "addresponse",
            AdminCommand::DelResponse { .. } => "delresponse",
            AdminCommand::Responses => "responses",
            AdminCommand::AddSpam { .. } => "addspam",
            AdminCommand::DelSpam { .. } => "delspam",
            AdminCommand::SpamPatterns => "spampatterns",
        }
    }

    /// Run the command against the store and build the chat reply.
    ///
    /// `None` means the author was not allowed to run it and nothing should
    /// be said.
    pub async fn execute(&self, store: &mut ConfigStore, ctx: &PrivilegeContext) -> Option<String> {
        let reply = match self {
            AdminCommand::AddResponse { trigger, response } => store
                .add_trigger(ctx, trigger, response)
                .await
                .map(|()| format!("Added response for '{}'", trigger)),
            AdminCommand::DelResponse { trigger } => {
                match store.remove_trigger(ctx, trigger).await {
                    Ok(()) => Ok(format!("Deleted response for '{}'", trigger)),
                    Err(StoreError::NotFound(_)) => {
                        Ok(format!("No response found for '{}'", trigger))
                    }
                    Err(e) => Err(e),
                }
            }
            AdminCommand::Responses => store.list_triggers(ctx).map(|triggers| {
                if triggers.is_empty() {
                    return "No responses configured".to_string();
                }

                let response_list = triggers
                    .iter()
                    .map(|(trigger, response)| format!("{}: {}", trigger, response))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("Current responses: {}", response_list)
            }),
            AdminCommand::AddSpam { pattern } => store
                .add_spam_pattern(ctx, pattern)
                .await
                .map(|()| format!("Added spam pattern '{}'", pattern)),
            AdminCommand::DelSpam { pattern } => {
                let pattern = pattern.to_lowercase();
                match store.remove_spam_pattern(ctx, &pattern).await {
                    Ok(()) => Ok(format!("Deleted spam pattern '{}'", pattern)),
                    Err(StoreError::NotFound(_)) => {
                        Ok(format!("Spam pattern '{}' not found", pattern))
                    }
                    Err(e) => Err(e),
                }
            }
            AdminCommand::SpamPatterns => store.list_spam_patterns(ctx).map(|patterns| {
                if patterns.is_empty() {
                    "No spam patterns configured".to_string()
                } else {
                    format!("Current spam patterns: {}", patterns.join(", "))
                }
            }),
        };

        match reply {
            Ok(reply) => {
                info!("Executed admin command '{}'", self.name());
                Some(reply)
            }
            Err(StoreError::Unauthorized) => {
                debug!("Ignoring unauthorized admin command '{}'", self.name());
                None
            }
            Err(StoreError::Persistence(e)) => {
                warn!("Admin command '{}' applied but not saved: {}", self.name(), e);
                Some(SAVE_FAILED_REPLY.to_string())
            }
            Err(StoreError::NotFound(what)) => Some(format!("'{}' not found", what)),
        }
    }
}

/// Pattern argument: the rest of the line, optionally wrapped in quotes
fn pattern_argument(args: &str) -> Option<String> {
    let unquoted = args
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(args)
        .trim();

    if unquoted.is_empty() {
        None
    } else {
        Some(unquoted.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BotConfig;
    use tempfile::tempdir;

    fn store_in(dir: &std::path::Path) -> ConfigStore {
        ConfigStore::new(BotConfig::new(vec!["chan".to_string()]), dir.join("config.yml"))
    }

    const MODERATOR: PrivilegeContext = PrivilegeContext {
        is_moderator: true,
        is_broadcaster: false,
    };

    #[test]
    fn test_split_command() {
        assert_eq!(
            split_command("!AddResponse go bye", "!"),
            Some(("addresponse".to_string(), "go bye"))
        );
        assert_eq!(split_command("!responses", "!"), Some(("responses".to_string(), "")));
        assert_eq!(split_command("!  delspam   x  ", "!"), Some(("delspam".to_string(), "x")));
        assert_eq!(split_command("!", "!"), None);
        assert_eq!(split_command("hello !there", "!"), None);
    }

    #[test]
    fn test_parse_add_response_keeps_rest_of_line() {
        let command = AdminCommand::parse("addresponse", "hello Hi there,  friend!").unwrap();
        assert_eq!(
            command,
            Some(AdminCommand::AddResponse {
                trigger: "hello".to_string(),
                response: "Hi there,  friend!".to_string(),
            })
        );
    }

    #[test]
    fn test_parse_missing_arguments() {
        assert!(AdminCommand::parse("addresponse", "onlytrigger").is_err());
        assert!(AdminCommand::parse("addresponse", "").is_err());
        assert!(AdminCommand::parse("delresponse", "  ").is_err());
        assert!(AdminCommand::parse("addspam", "").is_err());
        assert!(AdminCommand::parse("delspam", "\"\"").is_err());
    }

    #[test]
    fn test_parse_quoted_pattern() {
        assert_eq!(
            AdminCommand::parse("addspam", "\"free money\"").unwrap(),
            Some(AdminCommand::AddSpam {
                pattern: "free money".to_string()
            })
        );
        assert_eq!(
            AdminCommand::parse("delspam", "free money").unwrap(),
            Some(AdminCommand::DelSpam {
                pattern: "free money".to_string()
            })
        );
    }

    #[test]
    fn test_parse_unknown_command() {
        assert_eq!(AdminCommand::parse("hello", "world"), Ok(None));
    }

    #[tokio::test]
    async fn test_execute_replies() {
        let temp_dir = tempdir().unwrap();
        let mut store = store_in(temp_dir.path());

        let reply = AdminCommand::Responses.execute(&mut store, &MODERATOR).await;
        assert_eq!(reply.as_deref(), Some("No responses configured"));

        let add = AdminCommand::AddResponse {
            trigger: "Go".to_string(),
            response: "bye".to_string(),
        };
        assert_eq!(
            add.execute(&mut store, &MODERATOR).await.as_deref(),
            Some("Added response for 'Go'")
        );

        let reply = AdminCommand::Responses.execute(&mut store, &MODERATOR).await;
        assert_eq!(reply.as_deref(), Some("Current responses: go: bye"));

        let delete = AdminCommand::DelResponse {
            trigger: "missing".to_string(),
        };
        assert_eq!(
            delete.execute(&mut store, &MODERATOR).await.as_deref(),
            Some("No response found for 'missing'")
        );

        let delete = AdminCommand::DelSpam {
            pattern: "NonExistent".to_string(),
        };
        assert_eq!(
            delete.execute(&mut store, &MODERATOR).await.as_deref(),
            Some("Spam pattern 'nonexistent' not found")
        );

        let reply = AdminCommand::SpamPatterns.execute(&mut store, &MODERATOR).await;
        assert_eq!(reply.as_deref(), Some("Current spam patterns: casino"));
    }

    #[tokio::test]
    async fn test_execute_unauthorized_is_silent() {
        let temp_dir = tempdir().unwrap();
        let mut store = store_in(temp_dir.path());

        let add = AdminCommand::AddSpam {
            pattern: "scam".to_string(),
        };
        assert_eq!(add.execute(&mut store, &PrivilegeContext::default()).await, None);
        assert_eq!(store.spam_patterns(), &["casino".to_string()]);
    }

    #[tokio::test]
    async fn test_execute_reports_save_failure() {
        let temp_dir = tempdir().unwrap();
        let mut store = ConfigStore::new(
            BotConfig::new(vec!["chan".to_string()]),
            temp_dir.path().join("no_such_dir").join("config.yml"),
        );

        let add = AdminCommand::AddSpam {
            pattern: "scam".to_string(),
        };
        assert_eq!(add.execute(&mut store, &MODERATOR).await.as_deref(), Some(SAVE_FAILED_REPLY));
        assert!(store.spam_patterns().contains(&"scam".to_string()));
    }
}
