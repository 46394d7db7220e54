use crate::agent::{AgentError, AgentEvent, SqlAgent};
use crate::transcript::{Message, Transcript};

/// Everything one user session owns: the transcript and the agent answering into it.
#[derive(Debug)]
pub struct ChatSession {
    transcript: Transcript,
    agent: SqlAgent,
}

impl ChatSession {
    pub fn new(agent: SqlAgent) -> Self {
        Self {
            transcript: Transcript::new(),
            agent,
        }
    }

    pub fn messages(&self) -> &[Message] {
        self.transcript.snapshot()
    }

    pub fn dialect(&self) -> &'static str {
        self.agent.dialect()
    }

    pub fn reset(&mut self) {
        tracing::info!("transcript cleared");
        self.transcript.reset();
    }

    /// Record the question, ask the agent and record its reply. A failed turn is
    /// recorded as the assistant's reply too, so earlier turns stay as they were.
    pub async fn exchange<F>(&mut self, question: &str, on_event: F) -> Result<String, AgentError>
    where
        F: FnMut(AgentEvent),
    {
        self.transcript.append(Message::user(question));

        match self.agent.ask(question, on_event).await {
            Ok(answer) => {
                self.transcript.append(Message::assistant(answer.clone()));
                Ok(answer)
            }
            Err(err) => {
                tracing::error!(error = %err, "question failed");
                self.transcript
                    .append(Message::assistant(format!("Error: {err}")));
                Err(err)
            }
        }
    }
}
