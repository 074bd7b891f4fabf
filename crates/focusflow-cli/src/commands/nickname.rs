use clap::Subcommand;
use focusflow_core::{Database, Identity};

#[derive(Subcommand)]
pub enum NicknameAction {
    /// Print the current nickname
    Get,
    /// Set the nickname (an empty value clears it)
    Set {
        /// New nickname
        value: String,
    },
}

pub fn run(action: NicknameAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut db = Database::open()?;

    match action {
        NicknameAction::Get => {
            let identity = Identity::load(&db);
            if identity.is_empty() {
                eprintln!("no nickname set");
            } else {
                println!("{identity}");
            }
        }
        NicknameAction::Set { value } => {
            Identity::new(value).save(&mut db)?;
            println!("ok");
        }
    }
    Ok(())
}
