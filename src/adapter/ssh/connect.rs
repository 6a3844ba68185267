use std::{
    net::{TcpStream, ToSocketAddrs},
    time::Duration,
};

use ssh2::Session;
use tracing::{debug, info};

use crate::{
    config::{KeySource, RemoteSettings, SshKey},
    error::DeployError,
    progress::ProgressView,
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

pub(super) fn open_session(remote: &RemoteSettings, key: &SshKey) -> Result<Session, DeployError> {
    let connect_error = |message: String| DeployError::SshConnect {
        host: remote.host.clone(),
        message,
    };

    let stream = try_connection(&remote.host, remote.port).map_err(connect_error)?;

    ProgressView::with(format!("Handshaking with {}", remote.host), |progress| {
        let session = handshake(stream).and_then(|session| {
            authenticate(&session, &remote.user, key)?;
            Ok(session)
        });

        match &session {
            Ok(_) => progress.success(Some(format!("authenticated as {}", remote.user).as_str())),
            Err(err) => progress.failure(Some(err.as_str())),
        }

        session.map_err(connect_error)
    })
}

fn try_connection(host: &str, port: u16) -> Result<TcpStream, String> {
    let addrs = (host, port)
        .to_socket_addrs()
        .map_err(|err| format!("could not resolve address: {err}"))?;

    let mut last_error = None;
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT) {
            Ok(stream) => {
                info!(%addr, "tcp connection established");
                return Ok(stream);
            }
            Err(err) => {
                debug!(%addr, %err, "connection attempt failed");
                last_error = Some(err);
            }
        }
    }

    Err(last_error
        .map(|err| err.to_string())
        .unwrap_or_else(|| "host resolved to no address".to_string()))
}

fn handshake(stream: TcpStream) -> Result<Session, String> {
    let mut session = Session::new().map_err(|err| format!("could not create session: {err}"))?;
    session.set_tcp_stream(stream);
    session
        .handshake()
        .map_err(|err| format!("handshake failed: {err}"))?;

    Ok(session)
}

fn authenticate(session: &Session, user: &str, key: &SshKey) -> Result<(), String> {
    let source = key.source().map_err(|err| err.to_string())?;
    let passphrase = key.passphrase.as_deref();

    match source {
        KeySource::File(path) => {
            debug!(path = %path.display(), "authenticating with key file");
            session
                .userauth_pubkey_file(user, None, &path, passphrase)
                .map_err(|err| format!("key authentication failed: {err}"))?;
        }
        KeySource::Inline(material) => {
            debug!("authenticating with inline key");
            authenticate_inline(session, user, material, passphrase)?;
        }
    }

    if !session.authenticated() {
        return Err("server did not accept the key".to_string());
    }

    Ok(())
}

#[cfg(unix)]
fn authenticate_inline(
    session: &Session,
    user: &str,
    material: &str,
    passphrase: Option<&str>,
) -> Result<(), String> {
    session
        .userauth_pubkey_memory(user, None, material, passphrase)
        .map_err(|err| format!("key authentication failed: {err}"))
}

#[cfg(not(unix))]
fn authenticate_inline(
    _session: &Session,
    _user: &str,
    _material: &str,
    _passphrase: Option<&str>,
) -> Result<(), String> {
    Err("inline keys are not supported on this platform, use ssh_key.path".to_string())
}
