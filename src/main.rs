use anyhow::Context;

fn main() -> anyhow::Result<()> {
    daybook::run().context("daybook failed")?;
    Ok(())
}
