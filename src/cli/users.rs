use anyhow::{anyhow, Context};
use clap::Subcommand;
use rand::Rng;
use std::sync::Arc;

use crate::auth::{hash_password, AuthService};
use crate::storage::{User, UserLookup, UserStore, UserUpdate};

/// User management subcommands
#[derive(Subcommand)]
pub enum UserCommands {
    /// Create a new user
    Create {
        /// User's email address
        #[arg(short, long)]
        email: String,

        /// Password (if not provided, a random one will be generated)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// List all users
    List,

    /// Show user details
    Show {
        /// User's email address
        email: String,
    },

    /// Find a user by any column (id, email, session_id, reset_token)
    Find {
        #[arg(short, long)]
        column: String,

        #[arg(short, long)]
        value: String,
    },

    /// Reset a user's password
    ResetPassword {
        /// User's email address
        #[arg(short, long)]
        email: String,

        /// New password (if not provided, a random one will be generated)
        #[arg(short, long)]
        password: Option<String>,
    },
}

impl UserCommands {
    /// Execute the user command
    pub async fn execute(self, user_store: Arc<dyn UserStore>) -> anyhow::Result<()> {
        match self {
            UserCommands::Create { email, password } => {
                let password = password.unwrap_or_else(generate_secure_password);
                let user = AuthService::new(user_store)
                    .register_user(&email, &password)
                    .await?;

                println!("✅ User created successfully!");
                println!();
                println!("   ID:       {}", user.id);
                println!("   Email:    {}", user.email);
                println!("   Password: {}", password);
                println!();
                println!("⚠️  Please securely share these credentials with the user.");
            }

            UserCommands::List => {
                let users = user_store.list_users().await?;

                if users.is_empty() {
                    println!("No users found.");
                    return Ok(());
                }

                println!("{:<36} {:<30} {:<8}", "ID", "Email", "Session");
                println!("{}", "-".repeat(76));

                for user in users {
                    println!(
                        "{:<36} {:<30} {:<8}",
                        user.id,
                        truncate(&user.email, 28),
                        if user.session_id.is_some() { "Yes" } else { "No" }
                    );
                }
            }

            UserCommands::Show { email } => {
                let user = find_user(user_store.as_ref(), UserLookup::Email(email)).await?;
                print_user(&user);
            }

            UserCommands::Find { column, value } => {
                let lookup = UserLookup::parse(&column, &value)?;
                let user = find_user(user_store.as_ref(), lookup).await?;
                print_user(&user);
            }

            UserCommands::ResetPassword { email, password } => {
                let user = find_user(user_store.as_ref(), UserLookup::Email(email)).await?;
                let password = password.unwrap_or_else(generate_secure_password);
                let password_hash = hash_password(&password).context("Failed to hash password")?;

                user_store
                    .update_user(
                        user.id,
                        &[
                            UserUpdate::HashedPassword(password_hash),
                            UserUpdate::ResetToken(None),
                        ],
                    )
                    .await?;

                println!("✅ Password reset successfully!");
                println!();
                println!("   Email:        {}", user.email);
                println!("   New Password: {}", password);
                println!();
                println!("⚠️  Please securely share the new password with the user.");
            }
        }

        Ok(())
    }
}

async fn find_user(user_store: &dyn UserStore, lookup: UserLookup) -> anyhow::Result<User> {
    user_store
        .find_user_by(&lookup)
        .await?
        .ok_or_else(|| anyhow!("No user found for {}", lookup))
}

fn print_user(user: &User) {
    println!("User Details:");
    println!("  ID:          {}", user.id);
    println!("  Email:       {}", user.email);
    println!("  Session:     {}", if user.session_id.is_some() { "Active" } else { "None" });
    println!("  Reset token: {}", if user.reset_token.is_some() { "Pending" } else { "None" });
    println!("  Created:     {}", user.created_at);
    println!("  Updated:     {}", user.updated_at);
}

/// Generate a secure random password
fn generate_secure_password() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghjkmnpqrstuvwxyz23456789!@#$%&*";
    let mut rng = rand::thread_rng();

    (0..16)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// Truncate string to max length with ellipsis
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_password() {
        let password = generate_secure_password();
        assert_eq!(password.chars().count(), 16);
        assert_ne!(password, generate_secure_password());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a-very-long-email@example.com", 10), "a-very-...");
    }
}
