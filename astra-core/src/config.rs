use crate::{
    Consistency, Context, Error, MappingError, RequestDefaults, RequestProfile, Result,
};
use std::{env, path::PathBuf, time::Duration};
use url::Url;
use urlencoding::decode;

pub const URL_SCHEME: &str = "astra";
pub const BUNDLE_ENV: &str = "ASTRA_DB_SECURE_BUNDLE_PATH";
pub const TOKEN_ENV: &str = "ASTRA_DB_APPLICATION_TOKEN";

/// Everything needed to open a session, plus the request defaults of the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionOptions {
    /// Host part of the url, informational: the bundle selects the endpoint.
    pub database: String,
    pub secure_connect_bundle: PathBuf,
    pub token: String,
    pub keyspace: String,
    pub defaults: RequestDefaults,
}

impl ConnectionOptions {
    pub fn new(
        secure_connect_bundle: impl Into<PathBuf>,
        token: impl Into<String>,
        keyspace: impl Into<String>,
    ) -> Self {
        Self {
            database: String::new(),
            secure_connect_bundle: secure_connect_bundle.into(),
            token: token.into(),
            keyspace: keyspace.into(),
            defaults: Default::default(),
        }
    }

    /// Parse `astra://token:<token>@<database>/<keyspace>?bundle=<path>&read.consistency=LocalOne`.
    ///
    /// Missing bundle and token fall back to the environment variables
    /// [`BUNDLE_ENV`] and [`TOKEN_ENV`]. Query pairs prefixed with `read.` or
    /// `write.` set the request defaults.
    pub fn from_url(url: &str) -> Result<Self> {
        let context = || format!("While parsing the connection url `{}`", redact(url));
        let prefix = format!("{}://", URL_SCHEME);
        if !url.starts_with(&prefix) {
            let error = Error::msg(format!(
                "Astra connection url must start with `{}`",
                &prefix
            ))
            .context(context());
            log::error!("{:#}", error);
            return Err(error);
        }
        let url = Url::parse(url).with_context(context)?;
        let token = match url.password() {
            Some(password) => decode(password).with_context(context)?.into_owned(),
            None => decode(url.username()).with_context(context)?.into_owned(),
        };
        let token = Some(token)
            .filter(|v| !v.is_empty())
            .or_else(|| env::var(TOKEN_ENV).ok())
            .unwrap_or_default();
        let keyspace = url
            .path_segments()
            .and_then(|mut v| v.next())
            .map(decode)
            .transpose()
            .with_context(context)?
            .map(|v| v.into_owned())
            .unwrap_or_default();
        let mut bundle = None;
        let mut pairs = Vec::new();
        for (key, value) in url.query_pairs() {
            match &*key {
                "bundle" | "secure_connect_bundle" => bundle = Some(value.into_owned()),
                _ => pairs.push((key.into_owned(), value.into_owned())),
            }
        }
        let bundle = bundle
            .or_else(|| env::var(BUNDLE_ENV).ok())
            .unwrap_or_default();
        let result = Self {
            database: url.host_str().unwrap_or_default().to_owned(),
            secure_connect_bundle: bundle.into(),
            token,
            keyspace,
            defaults: RequestDefaults::from_pairs(pairs).with_context(context)?,
        };
        result.validate().with_context(context)?;
        Ok(result)
    }

    /// Bundle path, token and keyspace must be present.
    pub fn validate(&self) -> Result<()> {
        if self.secure_connect_bundle.as_os_str().is_empty() {
            return Err(
                MappingError::invalid_argument("Secure connect bundle path must be provided")
                    .into(),
            );
        }
        if self.token.trim().is_empty() {
            return Err(MappingError::invalid_argument("Token must be provided").into());
        }
        if self.keyspace.trim().is_empty() {
            return Err(MappingError::invalid_argument("Keyspace must be provided").into());
        }
        Ok(())
    }
}

fn redact(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) if parsed.password().is_some() => {
            let _ = parsed.set_password(Some("***"));
            parsed.into()
        }
        _ => url.to_owned(),
    }
}

impl RequestDefaults {
    /// Bind `read.<key>` and `write.<key>` pairs, where key is one of `consistency`,
    /// `idempotent`, `tracing`, `page_size`, `timeout_ms`.
    ///
    /// Unknown keys are ignored, malformed values are errors.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Result<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut result = RequestDefaults::default();
        for (key, value) in pairs {
            let (key, value) = (key.as_ref(), value.as_ref());
            let profile = match key.split_once('.') {
                Some(("read", rest)) => Some((&mut result.read, rest)),
                Some(("write", rest)) => Some((&mut result.write, rest)),
                _ => None,
            };
            match profile {
                Some((profile, name)) => {
                    if !profile.set(name, value)? {
                        log::warn!("Unknown request option `{}` is ignored", key);
                    }
                }
                None => log::warn!("Unknown connection option `{}` is ignored", key),
            }
        }
        Ok(result)
    }
}

impl RequestProfile {
    /// Set the option `name`, false when there is no such option.
    pub fn set(&mut self, name: &str, value: &str) -> Result<bool> {
        let invalid = |e: &dyn std::fmt::Display| {
            MappingError::invalid_argument(format!("Invalid value `{value}` for `{name}`: {e}"))
        };
        match name {
            "consistency" => self.consistency = Some(value.parse::<Consistency>()?),
            "idempotent" => {
                self.idempotent = Some(value.parse().map_err(|e| invalid(&e))?);
            }
            "tracing" => self.tracing = Some(value.parse().map_err(|e| invalid(&e))?),
            "page_size" => self.page_size = Some(value.parse().map_err(|e| invalid(&e))?),
            "timeout_ms" => {
                let millis: u64 = value.parse().map_err(|e| invalid(&e))?;
                self.timeout = Some(Duration::from_millis(millis));
            }
            _ => return Ok(false),
        }
        Ok(true)
    }
}
