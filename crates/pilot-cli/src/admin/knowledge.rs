//! `pilot kb` - knowledge-base collections, uploads and queries

use std::path::PathBuf;

use clap::Subcommand;
use pilot_client::AgentClient;
use pilot_client::api::knowledge::DEFAULT_COLLECTION;

use super::expect_ack;
use crate::utils::truncate_chars;

#[derive(Subcommand, Debug)]
pub enum KbCommand {
    /// List collections in the vector store
    Collections,
    /// Show the collection the agent searches
    Active,
    /// Select the collection the agent searches ("none" disables retrieval)
    Use { name: String },
    /// Upload documents into a collection
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Target collection
        #[arg(long, default_value = DEFAULT_COLLECTION)]
        collection: String,
    },
    /// Search the active collection
    Query {
        text: String,
        /// Number of chunks to return
        #[arg(long, default_value_t = 3)]
        top_k: u32,
    },
    /// Delete a collection
    Delete { name: String },
}

impl KbCommand {
    pub async fn run(self, client: &AgentClient) -> anyhow::Result<()> {
        let kb = client.knowledge();
        match self {
            KbCommand::Collections => {
                let active = kb.active().await?;
                let collections = kb.collections().await?;
                if collections.is_empty() {
                    println!("No collections. Upload documents with `pilot kb upload`.");
                }
                for name in collections {
                    let marker = if active.as_deref() == Some(name.as_str()) { " *" } else { "" };
                    println!("  {}{}", name, marker);
                }
            }
            KbCommand::Active => match kb.active().await? {
                Some(name) => println!("{}", name),
                None => println!("No active collection (retrieval disabled)."),
            },
            KbCommand::Use { name } => {
                let target = if name.eq_ignore_ascii_case("none") {
                    None
                } else {
                    Some(name.as_str())
                };
                expect_ack(kb.set_active(target).await?, "Active collection updated.")?;
            }
            KbCommand::Upload { files, collection } => {
                let result = kb.upload(&files, &collection).await?;
                if !result.success {
                    anyhow::bail!("upload into {} failed", collection);
                }
                println!(
                    "Indexed {} file(s) into {} ({} chunks).",
                    files.len(),
                    result.collection,
                    result.chunks
                );
            }
            KbCommand::Query { text, top_k } => {
                let result = kb.query(&text, top_k).await?;
                if let Some(error) = result.error {
                    println!("Query failed: {}", error);
                    if let Some(hint) = result.hint {
                        println!("Hint: {}", hint);
                    }
                    return Ok(());
                }
                if result.hits.is_empty() {
                    println!("No matches.");
                }
                for (i, hit) in result.hits.iter().enumerate() {
                    println!("Result {} (score {:.3})", i + 1, hit.score);
                    println!("{}\n", truncate_chars(&hit.content, 500));
                }
            }
            KbCommand::Delete { name } => {
                expect_ack(kb.delete_collection(&name).await?, "Collection deleted.")?;
            }
        }
        Ok(())
    }
}
