//! Account commands.
//!
//! Demo accounts: `demo@shophub.com` / `demo123` and
//! `john@example.com` / `password123`. Accounts created with `signup` only
//! last for the invocation that created them, though the signed-in session
//! itself is saved.

use clap::Subcommand;
use secrecy::SecretString;

use shophub_core::Email;
use shophub_storefront::AppError;
use shophub_storefront::models::{ProfileUpdate, User};
use shophub_storefront::services::auth::SignupForm;

use super::{Context, print_pending_merge};

#[derive(Subcommand)]
pub enum AccountAction {
    /// Sign in
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },
    /// Create an account and sign in
    Signup {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,

        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(long)]
        phone: Option<String>,
    },
    /// Sign out
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Update the signed-in user's profile
    Profile {
        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        /// Avatar image URL
        #[arg(long)]
        avatar: Option<String>,
    },
}

pub async fn run(ctx: &mut Context, action: AccountAction) -> Result<(), AppError> {
    match action {
        AccountAction::Login { email, password } => {
            let user = ctx.session.login(&email, &password).await?;
            print_message(&format!("Welcome back, {}!", user.first_name));
            print_pending_merge(&ctx.session);
        }
        AccountAction::Signup {
            email,
            password,
            first_name,
            last_name,
            phone,
        } => {
            let user = ctx
                .session
                .signup(SignupForm {
                    email,
                    password: SecretString::from(password),
                    first_name,
                    last_name,
                    phone,
                })
                .await?;
            print_message(&format!("Account created. Welcome, {}!", user.first_name));
            print_pending_merge(&ctx.session);
        }
        AccountAction::Logout => {
            if ctx.session.user().is_none() {
                print_message("You are not signed in.");
            } else {
                ctx.session.logout();
                print_message("Signed out.");
            }
        }
        AccountAction::Whoami => match ctx.session.user() {
            Some(user) => print_user(user),
            None => print_message("You are not signed in."),
        },
        AccountAction::Profile {
            email,
            first_name,
            last_name,
            phone,
            avatar,
        } => {
            let email = email
                .map(|e| Email::parse(&e))
                .transpose()
                .map_err(|e| AppError::BadRequest(format!("Invalid email: {e}")))?;
            let update = ProfileUpdate {
                email,
                first_name,
                last_name,
                phone,
                avatar,
            };
            if update.is_empty() {
                return Err(AppError::BadRequest(
                    "Nothing to update; pass at least one field".to_string(),
                ));
            }
            let user = ctx.session.update_profile(update).await?;
            print_message("Profile updated successfully!");
            print_user(&user);
        }
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_message(message: &str) {
    println!("{message}");
}

#[allow(clippy::print_stdout)]
fn print_user(user: &User) {
    println!("{} <{}>", user.full_name(), user.email);
    if let Some(phone) = &user.phone {
        println!("Phone:   {phone}");
    }
    if let Some(avatar) = &user.avatar {
        println!("Avatar:  {avatar}");
    }
    println!("Member since {}", user.joined_date.format("%B %-d, %Y"));
}
