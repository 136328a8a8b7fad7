pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Config(#[from] qm_config::Error),
	#[error(transparent)]
	Provider(#[from] qm_providers::Error),
	#[error("A Tokio runtime is required to start a search session.")]
	NoRuntime,
}
