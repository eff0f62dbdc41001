pub mod provider;
pub mod openai;
pub mod prompts;
pub mod parser;

pub use provider::OracleProvider;
pub use openai::OpenAiOracle;
pub use prompts::ClassificationRequest;
pub use parser::parse_oracle_response;
