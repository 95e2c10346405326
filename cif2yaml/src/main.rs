//! # cif2yaml
//!
//! CIF to Cif21 YAML/JSON Schema Converter
//!

use clap::Parser;
use std::error::Error;

use cif21::{CifLoader, CifReadOptions};
use cif21utils::{SerdeFile, SerializationFormat};

// => The doc-comment on `ProgramOptions` here is displayed by the `clap`-generated help docs =>

/// CIF to Cif21 YAML/JSON Schema Converter
#[derive(Parser)]
struct ProgramOptions {
    /// CIF Input File
    #[clap(short = 'i', long, default_value = "")]
    cif: String,
    /// Output File
    #[clap(short = 'o', long, default_value = "")]
    output: String,
    /// Output Format (json, yaml, or toml). Inferred from the output extension if not provided.
    #[clap(short = 'f', long)]
    format: Option<String>,
    /// Reader-Options File, in JSON, YAML, or TOML
    #[clap(short = 'c', long)]
    config: Option<String>,
    /// Write the JSON-Schema of the Cif21 data model, rather than converting
    #[clap(long)]
    schema: bool,
    /// Verbose Output Mode
    #[clap(short, long)]
    verbose: bool,
}

/// The main entry point.
/// All logic is offloaded to `_main` for sake of testing.
fn main() -> Result<(), Box<dyn Error>> {
    let options = ProgramOptions::parse();
    init_logging(options.verbose);
    _main(&options)
}

/// Install the `tracing` subscriber.
/// `RUST_LOG` takes precedence, otherwise `--verbose` selects debug-level output.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// All the real logic, with `ProgramOptions` argument for sake of testing
fn _main(options: &ProgramOptions) -> Result<(), Box<dyn Error>> {
    let format = output_format(options)?;

    if options.schema {
        let schema = schemars::schema_for!(cif21::CifFile);
        format.save(&schema, &options.output)?;
        tracing::info!(output = %options.output, "wrote schema");
        return Ok(());
    }

    // Load the reader options, if provided
    let read_options = match &options.config {
        Some(path) => {
            let fmt = SerializationFormat::from_path(path)
                .ok_or_else(|| format!("unknown config file format: {}", path))?;
            CifReadOptions::open(path, fmt)?
        }
        None => CifReadOptions::default(),
    };

    // Load CIF from file to a [CifFile].
    // Loader diagnostics are reported through the `tracing` subscriber.
    let cif_file = CifLoader::new(read_options).load_file(&options.cif)?;

    // And store the converted version of it
    format.save(&cif_file, &options.output)?;

    if options.verbose {
        println!("wrote {:?}", &options.output);
    }

    Ok(())
}

/// Select the output format: explicitly via `--format`, otherwise by output extension, defaulting to YAML
fn output_format(options: &ProgramOptions) -> Result<SerializationFormat, Box<dyn Error>> {
    match &options.format {
        Some(f) => SerializationFormat::from_extension(f)
            .ok_or_else(|| format!("unknown output format: {}", f).into()),
        None => Ok(SerializationFormat::from_path(&options.output)
            .unwrap_or(SerializationFormat::Yaml)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_to_yaml() -> Result<(), Box<dyn Error>> {
        let output_path = temp("sample.cif.yaml");
        let options = ProgramOptions {
            cif: resource("sample.cif"),
            output: output_path.clone(),
            format: None,
            config: None,
            schema: false,
            verbose: true,
        };

        // Run the main function, producing file `output_path`
        _main(&options)?;

        // Read back what it wrote to disk, and compare against a direct read
        use cif21utils::SerializationFormat::Yaml;
        let readback: cif21::CifFile = Yaml.open(&output_path)?;
        let golden = cif21::CifFile::open(resource("sample.cif"))?;
        assert_eq!(readback, golden);
        Ok(())
    }

    #[test]
    fn converts_to_json_with_options() -> Result<(), Box<dyn Error>> {
        let config_path = temp("cif2yaml_options.yaml");
        let opts = CifReadOptions {
            validate: false,
            ..Default::default()
        };
        opts.save(SerializationFormat::Yaml, &config_path)?;

        let output_path = temp("sample.cif.out");
        let options = ProgramOptions {
            cif: resource("sample.cif"),
            output: output_path.clone(),
            format: Some("json".into()),
            config: Some(config_path),
            schema: false,
            verbose: false,
        };
        _main(&options)?;

        let readback: cif21::CifFile = SerializationFormat::Json.open(&output_path)?;
        assert_eq!(readback.commands.len(), 18);
        Ok(())
    }

    #[test]
    fn converts_to_toml() -> Result<(), Box<dyn Error>> {
        let output_path = temp("sample.cif.toml");
        let options = ProgramOptions {
            cif: resource("sample.cif"),
            output: output_path.clone(),
            format: None,
            config: None,
            schema: false,
            verbose: false,
        };
        _main(&options)?;

        let readback: cif21::CifFile = SerializationFormat::Toml.open(&output_path)?;
        let golden = cif21::CifFile::open(resource("sample.cif"))?;
        assert_eq!(readback, golden);
        Ok(())
    }

    #[test]
    fn writes_schema() -> Result<(), Box<dyn Error>> {
        let output_path = temp("cif21.schema.json");
        let options = ProgramOptions {
            cif: String::new(),
            output: output_path.clone(),
            format: None,
            config: None,
            schema: true,
            verbose: false,
        };
        _main(&options)?;
        let schema = std::fs::read_to_string(&output_path)?;
        assert!(schema.contains("CifCommand"));
        Ok(())
    }

    #[test]
    fn fails_on_invalid_input() {
        let options = ProgramOptions {
            cif: resource("does_not_exist.cif"),
            output: temp("never_written.yaml"),
            format: None,
            config: None,
            schema: false,
            verbose: false,
        };
        assert!(_main(&options).is_err());
    }

    /// Grab the full path of resource-file `fname`
    fn resource(rname: &str) -> String {
        format!("{}/resources/{}", env!("CARGO_MANIFEST_DIR"), rname)
    }
    /// Grab a path in the system temporary directory
    fn temp(fname: &str) -> String {
        std::env::temp_dir().join(fname).display().to_string()
    }
}
