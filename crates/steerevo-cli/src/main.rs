mod checkpoint;
mod command;
mod config;
mod schema;
mod util;

fn main() -> anyhow::Result<()> {
    command::run()
}
