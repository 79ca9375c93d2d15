//! API key management commands.
//!
//! Provides `zmart keys list|add|get|update|remove`. Every subcommand unlocks
//! the vault first; writes always rewrite the whole encrypted list.

use clap::Args;
use zmart_core::{Config, SecretString};
use zmart_secrets::Credential;

use super::vault::{open_store, unlock};

/// Keys command arguments.
#[derive(Args)]
pub struct KeysArgs {
    #[command(subcommand)]
    pub command: KeysCommand,
}

#[derive(clap::Subcommand)]
pub enum KeysCommand {
    /// List stored keys (values masked)
    List,

    /// Store a new key (prompts for the key if omitted)
    Add {
        /// Display name, e.g. KuCoin
        #[arg(long)]
        name: String,

        /// Public API key
        #[arg(long)]
        key: Option<String>,

        /// API secret
        #[arg(long)]
        secret: Option<String>,

        /// API passphrase
        #[arg(long)]
        passphrase: Option<String>,
    },

    /// Look up a key by name (case-insensitive)
    Get {
        /// Service name
        name: String,

        /// Print unmasked values
        #[arg(long)]
        show: bool,
    },

    /// Change fields of the key at INDEX
    Update {
        /// Position shown by `zmart keys list`
        index: usize,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        key: Option<String>,

        #[arg(long)]
        secret: Option<String>,

        #[arg(long)]
        passphrase: Option<String>,
    },

    /// Delete the key at INDEX
    Remove {
        /// Position shown by `zmart keys list`
        index: usize,
    },
}

/// Mask all but the last four characters of a secret value.
pub fn mask(value: &SecretString) -> String {
    let chars: Vec<char> = value.expose_secret().chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len().max(4));
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), tail)
}

fn present(value: Option<&SecretString>) -> &'static str {
    match value {
        Some(v) if !v.is_empty() => "yes",
        _ => "no",
    }
}

fn print_credential(credential: &Credential, show: bool) {
    let render = |v: &SecretString| {
        if show {
            v.expose_secret().to_string()
        } else {
            mask(v)
        }
    };

    println!("Name:       {}", credential.name);
    println!("Key:        {}", render(&credential.key));
    if let Some(secret) = &credential.secret {
        println!("Secret:     {}", render(secret));
    }
    if let Some(passphrase) = &credential.passphrase {
        println!("Passphrase: {}", render(passphrase));
    }
}

/// Run the keys command.
pub async fn run(args: KeysArgs, config: &Config) -> anyhow::Result<()> {
    let store = unlock(open_store(config)?).await?;

    match args.command {
        KeysCommand::List => {
            let credentials = store.get_credentials()?;

            if credentials.is_empty() {
                println!("No API keys stored.");
            } else {
                println!(
                    "{:<6} {:<20} {:<24} {:<7} {}",
                    "INDEX", "NAME", "KEY", "SECRET", "PASSPHRASE"
                );
                println!("{}", "-".repeat(72));
                for (i, c) in credentials.iter().enumerate() {
                    println!(
                        "{:<6} {:<20} {:<24} {:<7} {}",
                        i,
                        c.name,
                        mask(&c.key),
                        present(c.secret.as_ref()),
                        present(c.passphrase.as_ref())
                    );
                }
                println!("\n{} key(s) total.", credentials.len());
            }
        }

        KeysCommand::Add {
            name,
            key,
            secret,
            passphrase,
        } => {
            let key = match key {
                Some(k) => k,
                None => rpassword::prompt_password(format!("API key for '{name}': "))
                    .map_err(|e| anyhow::anyhow!("Failed to read key: {}", e))?,
            };
            if name.trim().is_empty() || key.is_empty() {
                anyhow::bail!("Name and key must not be empty");
            }

            let mut credential = Credential::new(name.clone(), key);
            credential.secret = secret.map(SecretString::from);
            credential.passphrase = passphrase.map(SecretString::from);
            store.add_credential(credential)?;

            println!("API key '{}' stored.", name);
        }

        KeysCommand::Get { name, show } => match store.get_api_key(&name)? {
            Some(credential) => print_credential(&credential, show),
            None => anyhow::bail!("No API key named '{}'", name),
        },

        KeysCommand::Update {
            index,
            name,
            key,
            secret,
            passphrase,
        } => {
            let mut credential = store
                .get_credentials()?
                .into_iter()
                .nth(index)
                .ok_or_else(|| anyhow::anyhow!("No API key at index {}", index))?;

            if let Some(name) = name {
                credential.name = name;
            }
            if let Some(key) = key {
                credential.key = key.into();
            }
            if let Some(secret) = secret {
                credential.secret = Some(secret.into());
            }
            if let Some(passphrase) = passphrase {
                credential.passphrase = Some(passphrase.into());
            }

            let name = credential.name.clone();
            store.update_credential(index, credential)?;
            println!("API key '{}' updated.", name);
        }

        KeysCommand::Remove { index } => {
            let removed = store.remove_credential(index)?;
            println!("API key '{}' deleted.", removed.name);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_keeps_last_four() {
        assert_eq!(mask(&SecretString::new("abcdef123")), "*****f123");
    }

    #[test]
    fn test_mask_short_values_fully_hidden() {
        assert_eq!(mask(&SecretString::new("abc")), "****");
        assert_eq!(mask(&SecretString::new("")), "****");
    }

    #[test]
    fn test_present() {
        assert_eq!(present(None), "no");
        assert_eq!(present(Some(&SecretString::new(""))), "no");
        assert_eq!(present(Some(&SecretString::new("x"))), "yes");
    }
}
