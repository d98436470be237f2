// Print an Argon2id hash for users.yaml
//
// Usage: hash-password <password>
//        echo -n <password> | hash-password

use std::io::Read;

use anyhow::{bail, Context, Result};
use deskrelay_core::password::hash_password;

fn main() -> Result<()> {
    let password = match std::env::args().nth(1) {
        Some(password) => password,
        None => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read password from stdin")?;
            input.trim_end_matches(['\r', '\n']).to_string()
        }
    };

    if password.is_empty() {
        bail!("Password must not be empty");
    }

    println!("{}", hash_password(&password)?);
    Ok(())
}
