#![forbid(unsafe_code)]

//! Sigtuna CLI — compute and verify signature policy digests.

use base64::Engine;
use clap::{Parser, Subcommand};
use sigtuna_core::algorithm;
use sigtuna_policy::{
    DigestSpec, ObjectIdentifier, PolicyDocument, PolicyVerificationError,
    PolicyVerificationOutcome, PolicyVerifier, SignaturePolicy, SignaturePolicyData,
    StandardDigestProvider, TransformAlgorithm, XPath2Filter,
};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(
    name = "sigtuna",
    about = "Sigtuna — signature policy transform and digest verification",
    version
)]
struct Cli {
    /// Verbose diagnostics on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the digest of a policy document after applying transforms
    Digest {
        /// Policy document file
        file: PathBuf,

        /// Subtract-filter XPath expressions (applied first, in order)
        #[arg(short = 's', long = "subtract")]
        subtract: Vec<String>,

        /// Transform algorithm URIs (applied after filters, in order)
        #[arg(short = 't', long = "transform")]
        transform: Vec<String>,

        /// Digest algorithm URI
        #[arg(short = 'a', long, default_value = algorithm::SHA256)]
        algorithm: String,
    },

    /// Verify a policy document against an expected digest
    Verify {
        /// Policy document file
        file: PathBuf,

        /// Policy identifier the document is registered under
        #[arg(long)]
        id: String,

        /// Expected digest value, base64
        #[arg(short = 'd', long)]
        digest: String,

        /// Subtract-filter XPath expressions (applied first, in order)
        #[arg(short = 's', long = "subtract")]
        subtract: Vec<String>,

        /// Transform algorithm URIs (applied after filters, in order)
        #[arg(short = 't', long = "transform")]
        transform: Vec<String>,

        /// Digest algorithm URI
        #[arg(short = 'a', long, default_value = algorithm::SHA256)]
        algorithm: String,

        /// Declared policy location URL, carried through to the result
        #[arg(long)]
        location: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Digest {
            file,
            subtract,
            transform,
            algorithm,
        } => run_digest(&file, &subtract, &transform, &algorithm),
        Commands::Verify {
            file,
            id,
            digest,
            subtract,
            transform,
            algorithm,
            location,
        } => run_verify(&file, &id, &digest, &subtract, &transform, &algorithm, location),
    };

    if let Err(message) = result {
        eprintln!("error: {message}");
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_transforms(subtract: &[String], transform: &[String]) -> Vec<TransformAlgorithm> {
    let mut transforms = Vec::new();
    if !subtract.is_empty() {
        let filters = subtract
            .iter()
            .map(|xpath| XPath2Filter::subtract(xpath.as_str()))
            .collect();
        transforms.push(TransformAlgorithm::XPathFilter2(filters));
    }
    for uri in transform {
        transforms.push(TransformAlgorithm::from_uri(uri));
    }
    transforms
}

fn run_digest(
    file: &PathBuf,
    subtract: &[String],
    transform: &[String],
    algorithm: &str,
) -> Result<(), String> {
    let raw = std::fs::read(file).map_err(|e| format!("{}: {e}", file.display()))?;

    let document = PolicyDocument::parse(raw);
    let document =
        sigtuna_policy::transform::apply_transforms(document, &build_transforms(subtract, transform))
            .map_err(|e| e.to_string())?;
    let bytes = document.to_bytes().map_err(|e| e.to_string())?;

    let digest = sigtuna_crypto::digest::digest(algorithm, &bytes).map_err(|e| e.to_string())?;
    println!(
        "{}",
        base64::engine::general_purpose::STANDARD.encode(digest)
    );
    Ok(())
}

fn run_verify(
    file: &PathBuf,
    id: &str,
    digest_b64: &str,
    subtract: &[String],
    transform: &[String],
    algorithm: &str,
    location: Option<String>,
) -> Result<(), String> {
    let raw = std::fs::read(file).map_err(|e| format!("{}: {e}", file.display()))?;
    let expected = base64::engine::general_purpose::STANDARD
        .decode(digest_b64)
        .map_err(|e| format!("invalid base64 digest value: {e}"))?;

    let mut provider = sigtuna_policy::InMemoryPolicyProvider::new();
    provider.register(id, raw);

    let mut data = SignaturePolicyData::new(
        ObjectIdentifier::uri(id),
        DigestSpec::new(algorithm, expected),
    );
    data.transforms = build_transforms(subtract, transform);
    if let Some(url) = location {
        data = data.with_location_url(url);
    }

    let verifier = PolicyVerifier::new(&provider, &StandardDigestProvider);
    match verifier.verify(&SignaturePolicy::Identified(data)) {
        Ok(PolicyVerificationOutcome::Verified(v)) => {
            println!("OK: policy [{}] digest verified", v.identifier);
            Ok(())
        }
        Ok(PolicyVerificationOutcome::Implied) => {
            println!("OK: implied policy, nothing to verify");
            Ok(())
        }
        Err(e @ PolicyVerificationError::DigestMismatch { .. }) => {
            Err(format!("REJECTED: {e}"))
        }
        Err(e @ PolicyVerificationError::PolicyUnavailable { .. }) => {
            Err(format!("unavailable: {e}"))
        }
        Err(e @ PolicyVerificationError::TransformFailure { .. }) => {
            Err(format!("transform failure: {e}"))
        }
        Err(e @ PolicyVerificationError::CannotDigest { .. }) => {
            Err(format!("cannot digest: {e}"))
        }
    }
}
