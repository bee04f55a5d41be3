use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "tasktui",
    version,
    about = "Terminal task lists in a two-pane view",
    after_help = "Config is read from TASKTUI_CONFIG or the platform config dir.\n\
                  Set ENV=development or TASKTUI_LOG to write debug logs to tasktui.log."
)]
pub struct Cli {}
