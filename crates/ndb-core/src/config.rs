//! Lightweight configuration loader.
//!
//! Uses Figment to merge `ndb.toml` + `ndb.<env>.toml` + `NDB_*` env vars,
//! where `<env>` comes from `NDB_ENV` (default `dev`). Nested keys are
//! addressed in the environment with `__`, e.g. `NDB_ENGINE__WRITER_THREADS`.
use figment::{
    providers::{Env, Format, Toml},
    value::Value,
    Figment,
};
use std::env;

use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("NDB_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_for(&env_name)
    }

    pub fn load_for(env_name: &str) -> Result<Self> {
        let mut figment = Figment::new().merge(Toml::file("ndb.toml"));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file("ndb.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("ndb.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("ndb.test.toml")),
            other => return Err(Error::InvalidConfig(format!("unknown NDB_ENV '{other}'"))),
        }
        figment = figment.merge(Env::prefixed("NDB_").ignore(&["env", "log"]).split("__"));
        Ok(Self { figment })
    }

    /// Wraps an already assembled figment, e.g. one built from in-memory providers.
    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("failed to get '{key}': {e}")))
    }

    /// Like [`Config::get`], but an absent section yields `T::default()`.
    /// Unreadable sources are still errors.
    pub fn get_or_default<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        self.figment
            .extract::<Value>()
            .map_err(|e| Error::InvalidConfig(format!("failed to read configuration: {e}")))?;
        if !self.figment.contains(key) {
            return Ok(T::default());
        }
        self.get(key)
    }
}
