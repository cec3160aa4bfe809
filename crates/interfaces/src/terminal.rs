use crate::summary::describe_plan;
use crate::traits::{OriginConfirmer, PlanConfirmer};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use webpilot_core::Plan;

/// y/n approval over stdin. EOF or a read error counts as a refusal.
pub struct TerminalApprover;

impl TerminalApprover {
    pub fn new() -> Self {
        Self
    }

    async fn receive_input(&self) -> Option<String> {
        let stdin = tokio::io::stdin();
        let mut reader = BufReader::new(stdin);
        let mut line = String::new();

        match reader.read_line(&mut line).await {
            Ok(0) => None, // EOF
            Ok(_) => Some(line.trim().to_string()),
            Err(_) => None,
        }
    }

    async fn send_output(&self, message: &str) {
        let mut stdout = tokio::io::stdout();
        let _ = stdout.write_all(message.as_bytes()).await;
        let _ = stdout.write_all(b"\n").await;
        let _ = stdout.flush().await;
    }

    async fn request_approval(&self, prompt: &str) -> bool {
        self.send_output(prompt).await;
        self.send_output("Approve? (y/n): ").await;

        let approved = self
            .receive_input()
            .await
            .is_some_and(|response| is_yes(&response));
        tracing::debug!("Terminal approval answered: {}", approved);
        approved
    }
}

impl Default for TerminalApprover {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlanConfirmer for TerminalApprover {
    async fn confirm_plan(&self, plan: &Plan) -> bool {
        self.request_approval(&describe_plan(plan)).await
    }
}

#[async_trait]
impl OriginConfirmer for TerminalApprover {
    async fn confirm_origin_change(&self, from: &str, to: &str) -> bool {
        self.request_approval(&format!("Navigation leaves {} for {}", from, to))
            .await
    }
}

fn is_yes(response: &str) -> bool {
    response.to_lowercase().starts_with('y')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y"));
        assert!(is_yes("Yes"));
        assert!(!is_yes("n"));
        assert!(!is_yes(""));
    }
}
