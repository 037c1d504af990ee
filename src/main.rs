//! BlinkStick CLI tool

use std::error::Error;
use std::io::{self, Write};
use std::process;
use std::str::FromStr;
use std::time::Duration;

use clap::{
    crate_description, crate_name, crate_version, value_parser, Arg, ArgAction, ArgMatches, Command,
};

use blinkstick::usb::DEFAULT_TIMEOUT;
use blinkstick::{BlinkStick, Rgb, UsbContext, UsbTransport};

/// Colors used to test the available LEDs.
const TESTCOLORS: [Rgb; 6] = [
    Rgb { r: 0xff, g: 0x00, b: 0x00 },
    Rgb { r: 0x00, g: 0xff, b: 0x00 },
    Rgb { r: 0x00, g: 0x00, b: 0xff },
    Rgb { r: 0xff, g: 0x00, b: 0xff },
    Rgb { r: 0xff, g: 0xff, b: 0x00 },
    Rgb { r: 0xff, g: 0xff, b: 0xff },
];

type CliResult<T = ()> = Result<T, Box<dyn Error>>;

/// Device selection and transfer options.
#[derive(Debug, PartialEq, Eq)]
struct Config {
    serial: Option<String>,
    inverse: bool,
    timeout: Duration,
    channel: u8,
}

impl Config {
    fn from_cli(matches: &ArgMatches) -> Self {
        let mut config = Config::default();

        config.serial = matches.get_one::<String>("serial").cloned();
        config.inverse = matches.get_flag("inverse");

        if let Some(timeout) = matches.get_one::<u64>("timeout") {
            config.timeout = Duration::from_millis(*timeout);
        }

        if let Some(channel) = matches.get_one::<u8>("channel") {
            config.channel = *channel;
        }

        config
    }

    /// Open all devices matching this config.
    fn open_devices(&self) -> CliResult<Vec<BlinkStick<UsbTransport>>> {
        let context = UsbContext::with_timeout(self.timeout);

        let mut blinksticks = match &self.serial {
            Some(serial) => vec![context.find_by_serial(serial)?],
            None => context.find_all()?,
        };

        if blinksticks.is_empty() {
            return Err("no connected BlinkStick devices (root permissions may be required)".into());
        }

        for blinkstick in &mut blinksticks {
            blinkstick.set_inverse(self.inverse);
        }

        Ok(blinksticks)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self { serial: None, inverse: false, timeout: DEFAULT_TIMEOUT, channel: 0 }
    }
}

fn main() {
    env_logger::init();

    let cli = cli().get_matches();
    let (command, matches) = match cli.subcommand() {
        Some(subcommand) => subcommand,
        None => unreachable!("subcommand is required"),
    };

    let config = Config::from_cli(matches);
    let channel = config.channel;

    let result = match command {
        "list" => for_each_device(&config, list),
        "count" => for_each_device(&config, |stick| {
            match stick.try_led_count() {
                Ok(count) => println!("{}: {count}", stick.serial()),
                Err(err) => println!("{}: unknown ({err})", stick.serial()),
            }
            Ok(())
        }),
        "color" => {
            let index = matches.get_one::<u8>("index").copied().unwrap_or_default();
            let color = required_color(matches, command);
            for_each_device(&config, |stick| Ok(stick.set_rgb(channel, index, color.r, color.g, color.b)?))
        },
        "all" => {
            let color = required_color(matches, command);
            for_each_device(&config, |stick| Ok(stick.set_all_rgb(channel, color.r, color.g, color.b)?))
        },
        "off" => for_each_device(&config, |stick| Ok(stick.set_all_rgb(channel, 0, 0, 0)?)),
        "random" => {
            let index = matches.get_one::<u8>("index").copied().unwrap_or_default();
            for_each_device(&config, |stick| Ok(stick.set_random_color(channel, index)?))
        },
        "name" => match matches.get_one::<String>("value") {
            Some(name) => for_each_device(&config, |stick| Ok(stick.set_name(name)?)),
            None => for_each_device(&config, |stick| {
                let name = stick.try_name()?;
                println!("{}: {}", stick.serial(), name);
                Ok(())
            }),
        },
        "info" => match matches.get_one::<String>("value") {
            Some(info) => for_each_device(&config, |stick| Ok(stick.set_info(info)?)),
            None => for_each_device(&config, |stick| {
                let info = stick.try_info()?;
                println!("{}: {}", stick.serial(), info);
                Ok(())
            }),
        },
        "leds" => {
            let count = matches.get_one::<usize>("count").copied();
            for_each_device(&config, |stick| leds(stick, count))
        },
        "ledtest" => ledtest(&config),
        command => unreachable!("unknown subcommand {command}"),
    };

    if let Err(err) = result {
        eprintln!("\x1b[31mError:\x1b[0m {err}");
        process::exit(1);
    }
}

/// Run an operation on every selected device.
///
/// Failures are reported per device without aborting the remaining ones.
fn for_each_device<F>(config: &Config, mut f: F) -> CliResult
where
    F: FnMut(&mut BlinkStick<UsbTransport>) -> CliResult,
{
    let mut failed = 0;
    for mut blinkstick in config.open_devices()? {
        if let Err(err) = f(&mut blinkstick) {
            eprintln!("\x1b[31mError:\x1b[0m {}: {err}", blinkstick.serial());
            failed += 1;
        }
    }

    match failed {
        0 => Ok(()),
        failed => Err(format!("{failed} device(s) failed").into()),
    }
}

/// Print an overview of a device.
fn list(blinkstick: &mut BlinkStick<UsbTransport>) -> CliResult {
    let count = match blinkstick.led_count() {
        count if count < 0 => String::from("unknown"),
        count => count.to_string(),
    };

    println!("{}", blinkstick.serial());
    println!("  LEDs: {count}");
    println!("  Name: {}", blinkstick.name());
    println!("  Info: {}", blinkstick.info());

    Ok(())
}

/// Print the current LED colors.
fn leds(blinkstick: &mut BlinkStick<UsbTransport>, count: Option<usize>) -> CliResult {
    let count = count.unwrap_or_else(|| blinkstick.led_count().max(1) as usize);
    let data = blinkstick.led_data(count)?;

    println!("{}", blinkstick.serial());
    for (i, led) in data.chunks_exact(3).enumerate() {
        println!("  [{i}] {}", Rgb::new(led[0], led[1], led[2]));
    }

    Ok(())
}

/// Mark all LEDs in a unique color.
fn ledtest(config: &Config) -> CliResult {
    println!("Are you sure you want to test the available LEDs?");
    println!("\x1b[31mThis will overwrite the current colors\x1b[0m.");
    print!(" [y/N] > ");
    let _ = io::stdout().flush();

    // Abort unless the user agrees to overwrite the colors.
    if stdin_nextline().to_lowercase() != "y" {
        println!("Bailing out.");
        return Ok(());
    }

    println!("\nTesting available LEDs...\n");

    for_each_device(config, |stick| {
        let count = stick.led_count().max(1) as usize;
        let data = test_pattern(count);

        println!("{}", stick.serial());
        for (i, color) in TESTCOLORS.iter().cycle().take(count).enumerate() {
            println!("  Color for LED {i}: {color}");
        }

        Ok(stick.set_led_data(config.channel, &data)?)
    })
}

/// LED data cycling through the test colors.
fn test_pattern(count: usize) -> Vec<u8> {
    TESTCOLORS.iter().cycle().take(count).flat_map(|color| [color.r, color.g, color.b]).collect()
}

/// Get clap CLI parameters.
fn cli() -> Command {
    let color = Arg::new("color").help("LED color in RGB [0xRRGGBB]").long("color").short('c');
    let index = Arg::new("index")
        .help("Index of the LED")
        .long("index")
        .value_parser(value_parser!(u8));
    let value = Arg::new("value").help("New value to write to the device");

    Command::new(crate_name!())
        .version(crate_version!())
        .about(crate_description!())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("serial")
                .help("Only control the device with this serial number")
                .long("serial")
                .short('s')
                .global(true),
        )
        .arg(
            Arg::new("inverse")
                .help("Invert colors before sending them")
                .long("inverse")
                .short('i')
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("timeout")
                .help("USB transfer timeout in milliseconds")
                .long("timeout")
                .value_parser(value_parser!(u64))
                .global(true),
        )
        .arg(
            Arg::new("channel")
                .help("LED channel")
                .long("channel")
                .value_parser(value_parser!(u8))
                .global(true),
        )
        .subcommand(Command::new("list").about("List connected devices"))
        .subcommand(Command::new("count").about("Print the number of LEDs"))
        .subcommand(
            Command::new("color").about("Set a single LED").arg(color.clone()).arg(index.clone()),
        )
        .subcommand(Command::new("all").about("Set every LED to one color").arg(color))
        .subcommand(Command::new("off").about("Turn every LED off"))
        .subcommand(Command::new("random").about("Set a single LED to a random color").arg(index))
        .subcommand(Command::new("name").about("Read or write the device name").arg(value.clone()))
        .subcommand(Command::new("info").about("Read or write the info block").arg(value))
        .subcommand(
            Command::new("leds").about("Print the current LED colors").arg(
                Arg::new("count")
                    .help("Number of LEDs to read [default: LED count of the device]")
                    .long("count")
                    .short('n')
                    .value_parser(value_parser!(usize)),
            ),
        )
        .subcommand(Command::new("ledtest").about("Test available LEDs"))
}

/// Read the color option from CLI or prompt for STDIN if not present.
fn required_color(matches: &ArgMatches, command: &str) -> Rgb {
    if let Some(value) = matches.get_one::<String>("color") {
        match Rgb::from_str(value) {
            Ok(color) => return color,
            Err(err) => eprintln!("\x1b[31mInvalid --color '{value}': {err}.\x1b[0m\n"),
        }
    }

    let color = loop {
        // Query the user for the option.
        print!("Please select a color (format: 0xRRGGBB):\n > ");
        let _ = io::stdout().flush();

        let input = stdin_nextline();

        match Rgb::from_str(&input) {
            Ok(value) => {
                println!();
                break value;
            },
            Err(_) => eprintln!(
                "\x1b[31mColor '{}' does not match format 0xRRGGBB, please try again.\x1b[0m\n",
                input
            ),
        }
    };

    // Print CLI example to skip manual configuration.
    println!("To reapply this color, you can run the following command:\n");
    println!("{} {command} --color {color}\n", crate_name!());

    color
}

/// Read next line from STDIN.
#[inline]
fn stdin_nextline() -> String {
    let mut input = String::new();

    let _ = io::stdin().read_line(&mut input);
    input = input.trim().to_string();

    input
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn config_defaults() {
        let matches = cli().get_matches_from(["blinkstick", "list"]);
        let (_, matches) = matches.subcommand().unwrap();

        assert_eq!(Config::from_cli(matches), Config::default());
    }

    #[test]
    fn config_from_global_args() {
        let matches = cli().get_matches_from([
            "blinkstick",
            "all",
            "--serial",
            "BS000001-3.0",
            "--inverse",
            "--timeout",
            "250",
            "--channel",
            "2",
            "--color",
            "0x102030",
        ]);
        let (command, matches) = matches.subcommand().unwrap();
        let config = Config::from_cli(matches);

        assert_eq!(command, "all");
        assert_eq!(config.serial.as_deref(), Some("BS000001-3.0"));
        assert!(config.inverse);
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert_eq!(config.channel, 2);
        assert_eq!(required_color(matches, command), Rgb::new(0x10, 0x20, 0x30));
    }

    #[test]
    fn test_pattern_cycles_colors() {
        let data = test_pattern(8);

        assert_eq!(data.len(), 24);
        assert_eq!(&data[..3], &[0xff, 0x00, 0x00]);
        assert_eq!(&data[18..21], &[0xff, 0x00, 0x00]);
        assert_eq!(&data[21..], &[0x00, 0xff, 0x00]);
    }
}
