fn main() -> anyhow::Result<()> {
    mood_sanctuary_lib::run()
}
