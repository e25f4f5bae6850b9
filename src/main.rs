use std::io::{Read, Write};
use std::process;

use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;

use fi_style_annotator::{
    AnnotateError, AnnotatorConfig, Annotator, CommandAnalyzer, CommandHyphenator,
    ConlluAnalyzer, FinnishHyphenator, Hyphenator, LanguageAnalyzer, ParticiplePolicy,
};

#[derive(Parser)]
#[command(
    name = "fi-style-annotator",
    about = "Highlight adverbs, passives and difficult sentences in Finnish text",
    version
)]
struct Cli {
    /// File paths to analyze (reads stdin if none provided)
    files: Vec<String>,

    /// Inputs are CoNLL-U documents instead of raw text
    #[arg(long)]
    conllu: bool,

    /// Parser command that reads text on stdin and prints CoNLL-U
    #[arg(long, value_name = "PROGRAM", required_unless_present = "conllu")]
    analyzer: Option<String>,

    /// Argument passed to the parser command (repeatable)
    #[arg(long = "analyzer-arg", value_name = "ARG", allow_hyphen_values = true)]
    analyzer_args: Vec<String>,

    /// Hyphenation command that reads words one per line, e.g. voikkohyphenate
    #[arg(long, value_name = "PROGRAM")]
    hyphenator: Option<String>,

    /// Argument passed to the hyphenation command (repeatable)
    #[arg(long = "hyphenator-arg", value_name = "ARG", allow_hyphen_values = true)]
    hyphenator_args: Vec<String>,

    /// JSON configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<String>,

    /// Include the covered text in every span
    #[arg(long)]
    debug_text: bool,

    /// Handling of passive participles without an auxiliary
    #[arg(long, value_enum)]
    participles: Option<ParticiplePolicy>,

    /// Skip the difficult-sentence classifier
    #[arg(long)]
    no_difficult_sentences: bool,

    /// More log output (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    fn annotator_config(&self) -> Result<AnnotatorConfig, AnnotateError> {
        let mut config = match &self.config {
            Some(path) => AnnotatorConfig::from_file(path)?,
            None => AnnotatorConfig::default(),
        };
        if self.debug_text {
            config.debug_text = true;
        }
        if let Some(participles) = self.participles {
            config.participles = participles;
        }
        if self.no_difficult_sentences {
            config.difficult_sentences = false;
        }
        Ok(config)
    }

    fn language_analyzer(&self) -> Box<dyn LanguageAnalyzer> {
        match (&self.analyzer, self.conllu) {
            (Some(program), false) => {
                Box::new(CommandAnalyzer::new(program.as_str()).args(self.analyzer_args.iter().cloned()))
            }
            _ => Box::new(ConlluAnalyzer),
        }
    }

    fn hyphenator(&self) -> Box<dyn Hyphenator> {
        match &self.hyphenator {
            Some(program) => Box::new(
                CommandHyphenator::new(program.as_str()).args(self.hyphenator_args.iter().cloned()),
            ),
            None => Box::new(FinnishHyphenator::new()),
        }
    }
}

fn run(cli: &Cli) -> Result<(), AnnotateError> {
    let annotator = Annotator::with_config(
        cli.language_analyzer(),
        cli.hyphenator(),
        cli.annotator_config()?,
    );

    let mut inputs = Vec::new();
    if cli.files.is_empty() {
        let mut input = String::new();
        std::io::stdin().read_to_string(&mut input)?;
        inputs.push(input);
    } else {
        for path in &cli.files {
            let text = std::fs::read_to_string(path).map_err(|e| {
                AnnotateError::Io(std::io::Error::new(e.kind(), format!("{path}: {e}")))
            })?;
            inputs.push(text);
        }
    }

    for input in &inputs {
        let result = annotator.analyze(input)?;
        let json = serde_json::to_string_pretty(&result)?;
        println!("{json}");
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    Builder::new()
        .filter_level(cli.log_level())
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
