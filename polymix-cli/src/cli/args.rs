//! CLI argument definitions for `polymix`.

use clap::{value_parser, Arg, ArgAction, Command};

fn settings_arg() -> Arg {
    Arg::new("settings")
        .long("settings")
        .short('S')
        .value_name("PATH")
        .help("Path to a MixerSettings JSON file")
}

fn effects_arg() -> Arg {
    Arg::new("effects-json")
        .long("effects-json")
        .short('E')
        .alias("effects")
        .value_name("PATH")
        .help("Path to JSON file containing Vec<AudioEffect> applied after mixing")
}

fn loops_arg() -> Arg {
    Arg::new("loops")
        .long("loops")
        .short('l')
        .value_name("N")
        .default_value("0")
        .allow_negative_numbers(true)
        .value_parser(value_parser!(i32))
        .help("Extra passes over each input, -1 loops forever")
}

fn fade_in_arg() -> Arg {
    Arg::new("fade-in")
        .long("fade-in")
        .value_name("MS")
        .value_parser(value_parser!(u64))
        .help("Fade every input in over MS milliseconds")
}

/// Build the CLI argument parser and command definitions.
pub fn build_cli() -> Command {
    Command::new("polymix")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Mix and play sample chunks")
        .arg_required_else_help(true)
        .subcommand_required(true)
        .subcommand(
            Command::new("play")
                .about("Play files together through the default output device")
                .arg(
                    Arg::new("INPUT")
                        .help("Audio files to play, one channel each")
                        .required(true)
                        .num_args(1..)
                        .index(1),
                )
                .arg(loops_arg())
                .arg(fade_in_arg())
                .arg(
                    Arg::new("fade-out-after")
                        .long("fade-out-after")
                        .value_name("MS")
                        .value_parser(value_parser!(u64))
                        .help("Start a one second fade out of everything after MS milliseconds"),
                )
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .value_name("MS")
                        .value_parser(value_parser!(u64))
                        .help("Stop every input after MS milliseconds"),
                )
                .arg(
                    Arg::new("volume")
                        .long("volume")
                        .short('v')
                        .value_name("VOLUME")
                        .value_parser(value_parser!(i32))
                        .help("Master volume, 0-128"),
                )
                .arg(settings_arg())
                .arg(effects_arg())
                .arg(
                    Arg::new("quiet")
                        .long("quiet")
                        .short('q')
                        .action(ArgAction::SetTrue)
                        .help("Don't show the status view"),
                ),
        )
        .subcommand(
            Command::new("render")
                .about("Mix tones and files offline into raw output-format bytes")
                .arg(
                    Arg::new("out")
                        .long("out")
                        .short('o')
                        .value_name("PATH")
                        .required(true)
                        .help("Where to write the raw mix"),
                )
                .arg(
                    Arg::new("tone")
                        .long("tone")
                        .value_name("HZ")
                        .action(ArgAction::Append)
                        .value_parser(value_parser!(f32))
                        .help("Add a one second sine tone at HZ"),
                )
                .arg(
                    Arg::new("file")
                        .long("file")
                        .short('f')
                        .value_name("PATH")
                        .action(ArgAction::Append)
                        .help("Add an audio file"),
                )
                .arg(
                    Arg::new("ms")
                        .long("ms")
                        .value_name("MS")
                        .default_value("1000")
                        .value_parser(value_parser!(u64))
                        .help("Length of the rendered output"),
                )
                .arg(loops_arg())
                .arg(fade_in_arg())
                .arg(settings_arg())
                .arg(effects_arg()),
        )
        .subcommand(
            Command::new("create")
                .about("Emit default JSON payloads")
                .subcommand_required(true)
                .subcommand(
                    Command::new("settings-json")
                        .about("Print a default MixerSettings JSON payload"),
                )
                .subcommand(
                    Command::new("effects-json")
                        .about("Print a default Vec<AudioEffect> JSON payload"),
                ),
        )
}
