//! CLI configuration: profile + environment + flags into `ModuleParams`.
//!
//! Flags win over the profile, the profile wins over `[defaults]`.

use secrecy::SecretString;

use openmanage_config::{
    Config, apply_ca_fallback, config_path, load_config, process_env, profile_params,
};
use openmanage_core::ModuleParams;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Resolve the connection options for a regular subcommand.
pub fn resolve_params(global: &GlobalOpts) -> Result<ModuleParams, CliError> {
    let cfg = load_config()?;
    let mut params = base_params(global, &cfg)?;
    apply_flags(&mut params, global);
    apply_ca_fallback(&mut params, process_env);
    Ok(params)
}

fn base_params(global: &GlobalOpts, cfg: &Config) -> Result<ModuleParams, CliError> {
    match cfg.profile(global.profile.as_deref()) {
        Ok((name, profile)) => {
            tracing::debug!(profile = name, "using profile");
            Ok(profile_params(profile, &cfg.defaults, process_env)?)
        }
        // An explicitly named profile must exist.
        Err(err) if global.profile.is_some() => Err(err.into()),
        Err(_) => {
            let host = global
                .hostname
                .as_deref()
                .ok_or_else(|| CliError::NoHost {
                    path: config_path().display().to_string(),
                })?;
            let mut params = ModuleParams::new(host);
            params.timeout = cfg.defaults.timeout;
            params.validate_certs = cfg.defaults.validate_certs;
            Ok(params)
        }
    }
}

fn apply_flags(params: &mut ModuleParams, global: &GlobalOpts) {
    if let Some(ref host) = global.hostname {
        params.hostname.clone_from(host);
    }
    if let Some(port) = global.port {
        params.port = port;
    }
    if let Some(ref user) = global.username {
        params.username = Some(user.clone());
    }
    if let Some(ref password) = global.password {
        params.password = Some(SecretString::from(password.clone()));
    }
    if let Some(ref token) = global.auth_token {
        params.auth_token = Some(SecretString::from(token.clone()));
    }
    if global.no_validate_certs {
        params.validate_certs = false;
    }
    if let Some(ref ca) = global.ca_path {
        params.ca_path = Some(ca.clone());
    }
    if let Some(timeout) = global.timeout {
        params.timeout = timeout;
    }
    params.check_mode |= global.check;
}
