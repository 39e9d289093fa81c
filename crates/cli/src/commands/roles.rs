//! Roles command handler.
//!
//! Prints the permission model: which content each role can read.

use clap::Args;
use docgate_knowledge::Role;

/// Show which roles can read which content
#[derive(Args, Debug)]
pub struct RolesCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl RolesCommand {
    pub fn execute(&self) -> anyhow::Result<()> {
        if self.json {
            let output: serde_json::Map<String, serde_json::Value> = Role::ALL
                .iter()
                .map(|role| {
                    let readable: Vec<&str> =
                        role.accessible_roles().iter().map(|r| r.as_str()).collect();
                    (
                        role.as_str().to_string(),
                        serde_json::json!({
                            "reads": readable,
                            "filterKey": role.filter_key(),
                        }),
                    )
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            for role in Role::ALL {
                let readable: Vec<&str> =
                    role.accessible_roles().iter().map(|r| r.as_str()).collect();
                println!("{:<12} {}", role.as_str(), readable.join(", "));
            }
        }

        Ok(())
    }
}
