use super::Context;

pub fn run(ctx: &Context) -> Result<(), String> {
    let session = super::load_session(ctx)?;
    print!("{}", super::render_log(&session));
    Ok(())
}
