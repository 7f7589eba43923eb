//! Account resolution: flags and environment (via clap) first, then the config file.

use anyhow::{Context, Result, anyhow};
use clap::Args;
use seedling_config::AccountConfig;
use seedling_types::{Credentials, ServerAddress};

#[derive(Debug, Default, Args)]
pub struct AccountArgs {
    /// Account email
    #[arg(long, env = "SEEDLING_EMAIL")]
    pub email: Option<String>,
    /// Account password
    #[arg(long, env = "SEEDLING_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
    /// Web app address, e.g. https://my.farm.bot
    #[arg(long, env = "SEEDLING_SERVER")]
    pub server: Option<String>,
}

struct Field {
    flag: &'static str,
    env: &'static str,
    key: &'static str,
}

const EMAIL: Field = Field {
    flag: "--email",
    env: "SEEDLING_EMAIL",
    key: "account.email",
};
const PASSWORD: Field = Field {
    flag: "--password",
    env: "SEEDLING_PASSWORD",
    key: "account.password",
};
const SERVER: Field = Field {
    flag: "--server",
    env: "SEEDLING_SERVER",
    key: "account.server",
};

fn pick(given: Option<&str>, fallback: Option<String>, field: &Field) -> Result<String> {
    given.map(str::to_owned).or(fallback).ok_or_else(|| {
        anyhow!(
            "missing {}: pass {}, set {}, or add {} to the config file",
            field.key.trim_start_matches("account."),
            field.flag,
            field.env,
            field.key
        )
    })
}

impl AccountArgs {
    pub fn server(&self, file: Option<&AccountConfig>) -> Result<ServerAddress> {
        let raw = pick(
            self.server.as_deref(),
            file.and_then(AccountConfig::server),
            &SERVER,
        )?;
        ServerAddress::parse(&raw).with_context(|| format!("invalid server address {raw:?}"))
    }

    pub fn credentials(&self, file: Option<&AccountConfig>) -> Result<Credentials> {
        let email = pick(
            self.email.as_deref(),
            file.and_then(AccountConfig::email),
            &EMAIL,
        )?;
        let password = pick(
            self.password.as_deref(),
            file.and_then(AccountConfig::password),
            &PASSWORD,
        )?;
        Ok(Credentials::parse(email, password)?)
    }
}
