//! `bl login`, `bl register`, `bl logout`, `bl whoami`, `bl profile`.

use super::{api_failure, require_session, toast_success};
use crate::output::{OutputMode, Renderable, pretty_kv, pretty_section, render, render_item};
use buglense_core::App;
use buglense_core::model::{LoginCredentials, RegisterData, User, UserPatch};
use buglense_core::store::NewToast;
use clap::Args;
use serde_json::json;
use std::io::{self, Write};

impl Renderable for User {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        pretty_section(w, &self.name)?;
        pretty_kv(w, "ID", &self.id)?;
        pretty_kv(w, "Email", &self.email)?;
        pretty_kv(w, "Role", &self.role)?;
        if let Some(avatar) = &self.avatar {
            pretty_kv(w, "Avatar", avatar)?;
        }
        pretty_kv(w, "Joined", self.created_at.format("%Y-%m-%d").to_string())
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{}\t{}\t{}\t{}",
            self.id, self.name, self.email, self.role
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["ID", "NAME", "EMAIL", "ROLE"]
    }
}

#[derive(Args, Debug)]
pub struct LoginArgs {
    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub password: String,

    /// Ask the server for a long-lived session.
    #[arg(long)]
    pub remember: bool,
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub password: String,

    /// Must repeat `--password`.
    #[arg(long)]
    pub password_confirmation: String,
}

/// Without flags, shows the profile; with flags, updates it.
#[derive(Args, Debug, Default)]
pub struct ProfileArgs {
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    /// Avatar image URL.
    #[arg(long)]
    pub avatar: Option<String>,
}

impl ProfileArgs {
    fn patch(&self) -> Option<UserPatch> {
        let patch = UserPatch {
            name: self.name.clone(),
            email: self.email.clone(),
            avatar: self.avatar.clone(),
        };
        (patch != UserPatch::default()).then_some(patch)
    }
}

pub fn run_login(app: &mut App, args: &LoginArgs, output: OutputMode) -> anyhow::Result<()> {
    let credentials = LoginCredentials {
        email: args.email.trim().to_string(),
        password: args.password.clone(),
        remember: args.remember.then_some(true),
    };
    match app.auth.login(&credentials) {
        Ok(user) => {
            let greeting = format!("Welcome back, {}", user.name);
            toast_success(&mut app.ui, "Signed in", greeting);
            render_item(&user, output)?;
            Ok(())
        }
        Err(err) => Err(api_failure(&mut app.ui, "Sign in failed", &err)),
    }
}

pub fn run_register(
    app: &mut App,
    args: &RegisterArgs,
    output: OutputMode,
) -> anyhow::Result<()> {
    let data = RegisterData {
        name: args.name.trim().to_string(),
        email: args.email.trim().to_string(),
        password: args.password.clone(),
        password_confirmation: args.password_confirmation.clone(),
    };
    match app.auth.register(&data) {
        Ok(user) => {
            let greeting = format!("Welcome, {}", user.name);
            toast_success(&mut app.ui, "Account created", greeting);
            render_item(&user, output)?;
            Ok(())
        }
        Err(err) => Err(api_failure(&mut app.ui, "Registration failed", &err)),
    }
}

/// Always succeeds locally, even when the server cannot be reached.
pub fn run_logout(app: &mut App, output: OutputMode) -> anyhow::Result<()> {
    let was_signed_in = app.auth.is_authenticated();
    app.sign_out();
    app.ui.add_toast(if was_signed_in {
        NewToast::success("Signed out")
    } else {
        NewToast::info("Already signed out")
    });
    render(output, &json!({ "authenticated": false }), |_, _| Ok(()))
}

pub fn run_whoami(app: &mut App, output: OutputMode) -> anyhow::Result<()> {
    let user = require_session(app)?;
    render_item(&user, output)?;
    Ok(())
}

pub fn run_profile(app: &mut App, args: &ProfileArgs, output: OutputMode) -> anyhow::Result<()> {
    let user = require_session(app)?;
    let Some(patch) = args.patch() else {
        render_item(&user, output)?;
        return Ok(());
    };
    match app.auth.update_profile(&patch) {
        Ok(updated) => {
            app.ui.add_toast(NewToast::success("Profile updated"));
            render_item(&updated, output)?;
            Ok(())
        }
        Err(err) => Err(api_failure(&mut app.ui, "Profile update failed", &err)),
    }
}
