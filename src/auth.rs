//! Login and registration forms.
use crate::api::CineBookApi;
use crate::error::{user_message, ApiError};
use crate::models::{LoginRole, RegisterRole, Registration};
use crate::render::{self, escape_html, AlertKind};
use serde::Deserialize;
use std::fmt::Write;
use tracing::{info, warn};

/// Cookie holding the bearer token between requests.
pub const TOKEN_COOKIE: &str = "authToken";

pub const CREDENTIALS_REQUIRED: &str = "Email and password are required.";
pub const FULLNAME_REQUIRED: &str = "Full Name is required for a Buyer.";
pub const OWNER_FIELDS_REQUIRED: &str = "All required fields must be filled for a Theatre Owner.";
pub const INVALID_ROLE: &str = "Invalid user role selected.";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    /// Rejected before any backend call.
    Invalid(String),
    Failed(String),
    Success { token: String, message: String },
}

fn parse_login_role(raw: Option<&str>) -> LoginRole {
    raw.and_then(|r| LoginRole::ALL.into_iter().find(|role| role.as_str() == r.trim()))
        .unwrap_or(LoginRole::Buyer)
}

pub async fn login(api: &dyn CineBookApi, form: &LoginForm) -> LoginOutcome {
    let email = form.email.trim();
    if email.is_empty() || form.password.is_empty() {
        return LoginOutcome::Invalid(CREDENTIALS_REQUIRED.to_string());
    }
    let role = parse_login_role(form.role.as_deref());
    match api.login(email, &form.password).await {
        Ok(token) => {
            info!(role = role.as_str(), "Login succeeded");
            LoginOutcome::Success {
                token: token.access_token,
                message: format!("Login successful as {}! Token received.", role.as_str()),
            }
        }
        Err(e) => {
            warn!("Login failed: {:#}", e);
            LoginOutcome::Failed(user_message(&e))
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub fullname: String,
    #[serde(default)]
    pub businessname: String,
    #[serde(default)]
    pub ownername: String,
    #[serde(default)]
    pub licensenumber: String,
    #[serde(default)]
    pub phone: String,
}

fn filled(value: &str) -> Option<String> {
    Some(value.trim().to_string()).filter(|v| !v.is_empty())
}

impl RegisterForm {
    /// Builds the role-tagged payload; only the chosen role's fields are kept.
    pub fn to_registration(&self) -> Result<Registration, ApiError> {
        let mut reg = Registration {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            role: RegisterRole::Buyer,
            fullname: None,
            businessname: None,
            ownername: None,
            licensenumber: None,
            phone: None,
        };
        if reg.email.is_empty() || reg.password.is_empty() {
            return Err(ApiError::Validation(CREDENTIALS_REQUIRED.to_string()));
        }
        match self.role.trim() {
            "" | "buyer" => {
                reg.fullname = Some(
                    filled(&self.fullname)
                        .ok_or_else(|| ApiError::Validation(FULLNAME_REQUIRED.to_string()))?,
                );
            }
            "theatreowner" => {
                let business = filled(&self.businessname);
                let owner = filled(&self.ownername);
                let license = filled(&self.licensenumber);
                match (business, owner, license) {
                    (Some(b), Some(o), Some(l)) => {
                        reg.role = RegisterRole::TheatreOwner;
                        reg.businessname = Some(b);
                        reg.ownername = Some(o);
                        reg.licensenumber = Some(l);
                        reg.phone = filled(&self.phone);
                    }
                    _ => return Err(ApiError::Validation(OWNER_FIELDS_REQUIRED.to_string())),
                }
            }
            _ => return Err(ApiError::Validation(INVALID_ROLE.to_string())),
        }
        Ok(reg)
    }
}

pub async fn register(api: &dyn CineBookApi, form: &RegisterForm) -> (AlertKind, String) {
    let registration = match form.to_registration() {
        Ok(r) => r,
        Err(e) => return (AlertKind::Error, e.to_string()),
    };
    match api.register(&registration).await {
        Ok(user) => {
            info!(role = registration.role.path_segment(), "Registered new user");
            (
                AlertKind::Success,
                format!("Registration successful! Welcome, {}.", user.email),
            )
        }
        Err(e) => {
            warn!("Registration failed: {:#}", e);
            (AlertKind::Error, user_message(&e))
        }
    }
}

pub fn render_login(notice: Option<(AlertKind, &str)>, email: &str, logged_in: bool) -> String {
    let notice = notice
        .map(|(kind, text)| render::alert(kind, text))
        .unwrap_or_default();
    let mut buttons = String::new();
    for role in LoginRole::ALL {
        let _ = write!(
            buttons,
            r#"<button class="btn btn-primary" type="submit" name="role" value="{}">Login as {}</button> "#,
            role.as_str(),
            role.label()
        );
    }
    let body = format!(
        r#"<div class="form-card" style="max-width:420px;margin:auto">
<h2>CineBook Login</h2><p>Enter your credentials and select your role</p>
{notice}
<form method="post" action="/login">
<input id="email-address" name="email" type="email" placeholder="Email address" value="{email}">
<input id="password" name="password" type="password" placeholder="Password">
<div>{buttons}</div>
</form>
<p><a href="/register">Create an account</a></p>
</div>"#,
        notice = notice,
        email = escape_html(email),
        buttons = buttons,
    );
    render::page("Login", logged_in, &body)
}

pub fn render_register(notice: Option<(AlertKind, &str)>, form: &RegisterForm, logged_in: bool) -> String {
    let notice = notice
        .map(|(kind, text)| render::alert(kind, text))
        .unwrap_or_default();
    let owner = form.role.trim() == "theatreowner";
    let option = |value: &str, label: &str, selected: bool| {
        format!(
            r#"<option value="{}"{}>{}</option>"#,
            value,
            if selected { " selected" } else { "" },
            label
        )
    };
    let field = |name: &str, label: &str, value: &str| {
        format!(
            r#"<label>{} <input id="{n}" name="{n}" value="{}"></label>"#,
            label,
            escape_html(value),
            n = name
        )
    };
    let body = format!(
        r#"<div class="form-card" style="max-width:480px;margin:auto">
<h2>Create your CineBook account</h2>
{notice}
<form method="post" action="/register">
<label>Role <select id="role" name="role">{buyer}{theatre}</select></label>
{email}
<label>Password <input id="password" name="password" type="password"></label>
<fieldset><legend>Buyer</legend>{fullname}</fieldset>
<fieldset><legend>Theatre Owner</legend>{business}{ownername}{license}{phone}</fieldset>
<button class="btn btn-primary" type="submit">Register</button>
</form>
<p><a href="/login">Already registered? Login</a></p>
</div>"#,
        notice = notice,
        buyer = option("buyer", "Buyer", !owner),
        theatre = option("theatreowner", "Theatre Owner", owner),
        email = field("email", "Email", &form.email),
        fullname = field("fullname", "Full Name", &form.fullname),
        business = field("businessname", "Business Name", &form.businessname),
        ownername = field("ownername", "Owner Name", &form.ownername),
        license = field("licensenumber", "License Number", &form.licensenumber),
        phone = field("phone", "Phone (optional)", &form.phone),
    );
    render::page("Register", logged_in, &body)
}
