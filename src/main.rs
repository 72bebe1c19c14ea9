//! Command-line frontend for the legacy signature converter.
//!
//! Reads one legacy token and writes the converted signature. The library
//! hands over an in-memory signature element; serialisation is the host's
//! side of that boundary, so this frontend carries its own
//! [`SignatureEncoder`] implementation. Extending the result against a
//! publications file likewise stays behind the library interfaces.

use clap::Parser;
use ksi_converter::{
    convert_bytes, ConvertError, ConvertResult, ConverterConfig, ExtenderSettings,
    SignatureEncoder, TlvElement,
};
use miette::{miette, Context, IntoDiagnostic, Result};
use std::io::{Read, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ksi-converter")]
#[command(about = "Converts legacy RFC 3161 time-stamp tokens into KSI-style TLV signatures")]
#[command(version)]
struct Cli {
    /// Legacy signature file (reads standard input when omitted)
    input: Option<PathBuf>,

    /// Output file for the converted signature (writes standard output
    /// when omitted; refuses to overwrite an existing file)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TOML configuration with extender and publications endpoints,
    /// passed through to a host SDK extender client
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        let config = ConverterConfig::load(path)?;
        let settings = ExtenderSettings::from(&config);
        if config.can_extend() {
            log::info!(
                "extender configured: {} / {}",
                settings.extender_url,
                settings.publications_file_url
            );
        } else {
            log::warn!("configuration is missing extender endpoints");
        }
    }

    let data = match &cli.input {
        Some(path) => std::fs::read(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("reading {}", path.display()))?,
        None => {
            let mut buffer = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buffer)
                .into_diagnostic()
                .wrap_err("reading standard input")?;
            buffer
        }
    };

    let converted = convert_bytes(&data)?;
    log::info!(
        "publication time {}, registration time {}, document hash algorithm {}",
        converted.publication_time(),
        converted.registration_time(),
        converted.document_hash().algorithm().name()
    );
    if !converted.is_extended() {
        log::info!("token is unextended; extend it against a publications file to finish");
    }

    let encoded = converted.encode_with(&TlvWireEncoder)?;
    match &cli.output {
        Some(path) => {
            if path.exists() {
                return Err(miette!("Output file already exists."));
            }
            std::fs::write(path, &encoded)
                .into_diagnostic()
                .wrap_err_with(|| format!("writing {}", path.display()))?;
        }
        None => {
            std::io::stdout()
                .write_all(&encoded)
                .into_diagnostic()
                .wrap_err("writing standard output")?;
        }
    }

    Ok(())
}

/// Wire serialiser for the signature element tree, standing in for the
/// SDK encoder this frontend would normally link against. Elements use
/// the compact 8-bit header when the type fits in five bits and the
/// payload in one length byte, and the 16-bit header otherwise.
struct TlvWireEncoder;

impl SignatureEncoder for TlvWireEncoder {
    fn encode(&self, signature: &TlvElement) -> ConvertResult<Vec<u8>> {
        let mut out = Vec::new();
        encode_element(signature, &mut out)?;
        Ok(out)
    }
}

fn encode_element(element: &TlvElement, out: &mut Vec<u8>) -> ConvertResult<()> {
    if element.element_type() > 0x1FFF {
        return Err(ConvertError::Argument(format!(
            "TLV element type out of range: 0x{:x}",
            element.element_type()
        )));
    }

    let payload = if element.children().is_empty() {
        element.content().to_vec()
    } else {
        let mut nested = Vec::new();
        for child in element.children() {
            encode_element(child, &mut nested)?;
        }
        nested
    };
    if payload.len() > 0xFFFF {
        return Err(ConvertError::Argument(format!(
            "TLV element 0x{:x} content too long: {} bytes",
            element.element_type(),
            payload.len()
        )));
    }

    let mut flags = 0u8;
    if element.non_critical() {
        flags |= 0x40;
    }
    if element.forward() {
        flags |= 0x20;
    }

    if element.element_type() > 0x1F || payload.len() > 0xFF {
        out.push(0x80 | flags | ((element.element_type() >> 8) as u8 & 0x1F));
        out.push((element.element_type() & 0xFF) as u8);
        out.push((payload.len() >> 8) as u8);
        out.push((payload.len() & 0xFF) as u8);
    } else {
        out.push(flags | element.element_type() as u8);
        out.push(payload.len() as u8);
    }
    out.extend_from_slice(&payload);
    Ok(())
}
