/// Mantaray - simulated actors, publishing and search on a decentralized data exchange
///
/// This is the root crate that provides workspace-level documentation.
/// Actual implementation is in the subcrates:
/// - `mantaray-core`: Users, asset records, queries, configuration
/// - `mantaray-client`: Ledger and metadata store clients and the façades built on them
/// - `mantaray-cli`: The `mantaray` command line tool

/// Returns the version of the package.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
