// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{value_parser, Arg, ArgAction, Command};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print JSON instead of a table"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn pair_args(cmd: Command) -> Command {
    cmd.arg(Arg::new("from").long("from").required(true).help("Source currency, e.g. USD"))
        .arg(Arg::new("to").long("to").required(true).help("Target currency, e.g. EUR"))
        .arg(Arg::new("date").long("date").required(true).help("YYYY-MM-DD"))
}

fn user_year(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("user")
            .long("user")
            .required(true)
            .value_parser(value_parser!(i64)),
    )
    .arg(
        Arg::new("year")
            .long("year")
            .required(true)
            .value_parser(value_parser!(i32)),
    )
}

fn asset_year(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("asset")
            .long("asset")
            .required(true)
            .value_parser(value_parser!(i64)),
    )
    .arg(
        Arg::new("year")
            .long("year")
            .required(true)
            .value_parser(value_parser!(i32)),
    )
}

pub fn build_cli() -> Command {
    Command::new("taxledger")
        .about("Multi-jurisdiction FX and tax summaries over a local ledger")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand(Command::new("init").about("Create the database and schema"))
        .subcommand(
            Command::new("fx")
                .about("Exchange rates")
                .subcommand(json_flags(pair_args(
                    Command::new("resolve").about("Resolve a rate through the priority chain"),
                )))
                .subcommand(pair_args(
                    Command::new("convert")
                        .about("Convert an amount, rounded to 2 decimals")
                        .arg(Arg::new("amount").long("amount").required(true)),
                ))
                .subcommand(pair_args(
                    Command::new("override")
                        .about("Set a manual rate that beats ECB rates")
                        .arg(Arg::new("rate").long("rate").required(true)),
                ))
                .subcommand(pair_args(
                    Command::new("unset-override").about("Remove a manual rate"),
                ))
                .subcommand(json_flags(
                    Command::new("list").about("List stored rates").arg(
                        Arg::new("limit")
                            .long("limit")
                            .value_parser(value_parser!(usize))
                            .default_value("50"),
                    ),
                ))
                .subcommand(
                    Command::new("fetch")
                        .about("Import ECB reference rates via Frankfurter")
                        .arg(
                            Arg::new("base")
                                .long("base")
                                .default_value("EUR")
                                .help("Base currency of the fetched rates"),
                        )
                        .arg(
                            Arg::new("days")
                                .long("days")
                                .value_parser(value_parser!(usize))
                                .default_value("30"),
                        ),
                ),
        )
        .subcommand(
            Command::new("report")
                .about("Tax summaries")
                .subcommand(json_flags(user_year(
                    Command::new("colombia").about("Colombian income/expense declaration"),
                )))
                .subcommand(json_flags(user_year(
                    Command::new("irpf").about("Spain IRPF by category and line item"),
                )))
                .subcommand(json_flags(user_year(
                    Command::new("modelo720").about("Spain foreign holdings threshold check"),
                )))
                .subcommand(json_flags(user_year(
                    Command::new("form5472").about("US owner contributions and draws"),
                )))
                .subcommand(json_flags(asset_year(
                    Command::new("schedule-e").about("US rental income for one property"),
                ))),
        )
        .subcommand(
            Command::new("asset").about("Assets").subcommand(json_flags(
                Command::new("depreciation")
                    .about("Straight-line depreciation as of a date")
                    .arg(
                        Arg::new("asset")
                            .long("asset")
                            .required(true)
                            .value_parser(value_parser!(i64)),
                    )
                    .arg(Arg::new("as-of").long("as-of").help("YYYY-MM-DD, defaults to today")),
            )),
        )
        .subcommand(
            Command::new("export").about("Write reports to disk").subcommand(
                Command::new("summary")
                    .about("Export a tax summary")
                    .arg(
                        Arg::new("kind")
                            .long("kind")
                            .required(true)
                            .value_parser(["colombia", "irpf", "modelo720", "form5472", "schedule-e"]),
                    )
                    .arg(
                        Arg::new("user")
                            .long("user")
                            .required_unless_present("asset")
                            .conflicts_with("asset")
                            .value_parser(value_parser!(i64)),
                    )
                    .arg(
                        Arg::new("asset")
                            .long("asset")
                            .help("Property for --kind schedule-e")
                            .value_parser(value_parser!(i64)),
                    )
                    .arg(
                        Arg::new("year")
                            .long("year")
                            .required(true)
                            .value_parser(value_parser!(i32)),
                    )
                    .arg(Arg::new("format").long("format").default_value("csv"))
                    .arg(Arg::new("out").long("out").required(true)),
            ),
        )
        .subcommand(
            Command::new("config")
                .about("Engine settings")
                .subcommand(json_flags(Command::new("show").about("Effective settings")))
                .subcommand(
                    Command::new("set")
                        .about("Store a setting")
                        .arg(Arg::new("key").required(true))
                        .arg(Arg::new("value").required(true)),
                ),
        )
        .subcommand(
            Command::new("doctor")
                .about("Data-quality checks")
                .arg(
                    Arg::new("year")
                        .long("year")
                        .value_parser(value_parser!(i32))
                        .help("Only check transactions in this year"),
                ),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        build_cli().debug_assert();
    }

    #[test]
    fn parses_report_arguments() {
        let m = build_cli()
            .try_get_matches_from(["taxledger", "report", "irpf", "--user", "1", "--year", "2024", "--json"])
            .unwrap();
        let (_, report) = m.subcommand().unwrap();
        let (name, sub) = report.subcommand().unwrap();
        assert_eq!(name, "irpf");
        assert_eq!(*sub.get_one::<i32>("year").unwrap(), 2024);
        assert!(sub.get_flag("json"));
    }

    #[test]
    fn export_takes_asset_or_user() {
        let ok = build_cli().try_get_matches_from([
            "taxledger", "export", "summary", "--kind", "schedule-e", "--asset", "3", "--year", "2024",
            "--out", "e.csv",
        ]);
        assert!(ok.is_ok());
        let neither = build_cli().try_get_matches_from([
            "taxledger", "export", "summary", "--kind", "irpf", "--year", "2024", "--out", "e.csv",
        ]);
        assert!(neither.is_err());
        let both = build_cli().try_get_matches_from([
            "taxledger", "export", "summary", "--kind", "irpf", "--user", "1", "--asset", "3",
            "--year", "2024", "--out", "e.csv",
        ]);
        assert!(both.is_err());
    }
}
