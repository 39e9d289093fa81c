//! Ask command handler.
//!
//! Answers a question using only the documents the given role may read.

use clap::Args;
use docgate_core::config::AppConfig;
use docgate_knowledge::{Pipeline, QueryRequest};

/// Ask a question as a role
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub query: String,

    /// Role to answer for (admin, finance, engineering, hr, marketing, employee)
    #[arg(short, long, default_value = "employee")]
    pub role: String,

    /// Number of chunks to retrieve
    #[arg(short = 'n', long)]
    pub n_results: Option<usize>,

    /// Do not ask the model to cite sources
    #[arg(long)]
    pub no_citations: bool,

    /// Maximum tokens in the answer
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Print sources and confidence after the answer
    #[arg(long, conflicts_with = "json")]
    pub with_sources: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    fn request(&self) -> QueryRequest {
        let mut request = QueryRequest::new(&self.query, &self.role);
        request.n_results = self.n_results;
        request.max_tokens = self.max_tokens;
        if self.no_citations {
            request.include_citations = Some(false);
        }
        request
    }

    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let pipeline = Pipeline::from_config(config).await?;
        let response = pipeline.answer_query(self.request()).await;

        tracing::debug!(
            "Answer: method={:?}, confidence={} ({:.3}), sources={}",
            response.metadata.method,
            response.confidence.level,
            response.confidence.score,
            response.sources.len()
        );

        if self.json {
            println!("{}", serde_json::to_string_pretty(&response)?);
        } else if self.with_sources {
            println!("{}", response.render_with_sources());
        } else {
            println!("{}", response.answer);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        ask: AskCommand,
    }

    #[test]
    fn test_request_from_flags() {
        let cli = TestCli::parse_from([
            "test",
            "What is the leave policy?",
            "--role",
            "hr",
            "-n",
            "3",
            "--no-citations",
        ]);
        let request = cli.ask.request();

        assert_eq!(request.query, "What is the leave policy?");
        assert_eq!(request.role, "hr");
        assert_eq!(request.n_results, Some(3));
        assert_eq!(request.include_citations, Some(false));
        assert_eq!(request.max_tokens, None);
    }

    #[test]
    fn test_defaults() {
        let cli = TestCli::parse_from(["test", "hello"]);
        let request = cli.ask.request();
        assert_eq!(request.role, "employee");
        assert_eq!(request.include_citations, None);
    }
}
