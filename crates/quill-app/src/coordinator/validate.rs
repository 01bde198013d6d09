//! Client-side validation of request actions.
//!
//! A request that fails here never reaches the network; the coordinator
//! turns the field messages into the feature's fail action.

use quill_core::types::{FieldErrors, Upload};

pub const VALIDATION_MESSAGE: &str = "Please fix the highlighted fields.";

const MIN_PASSWORD_LEN: usize = 8;
const MAX_NAME_LEN: usize = 80;
const MAX_BIO_LEN: usize = 500;
const MAX_TITLE_LEN: usize = 120;
const MAX_COMMENT_LEN: usize = 2_000;
const MAX_SUBJECT_LEN: usize = 150;

type Checked = Result<(), FieldErrors>;

fn finish(errors: FieldErrors) -> Checked {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn required(errors: &mut FieldErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, "This field is required.");
    }
}

fn max_len(errors: &mut FieldErrors, field: &str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.add(field, format!("Must be at most {max} characters."));
    }
}

fn email(errors: &mut FieldErrors, value: &str) {
    required(errors, "email", value);
    let value = value.trim();
    let well_formed = value
        .split_once('@')
        .is_some_and(|(user, domain)| !user.is_empty() && domain.contains('.'));
    if !value.is_empty() && !well_formed {
        errors.add("email", "Enter a valid email address.");
    }
}

fn file(errors: &mut FieldErrors, field: &str, upload: Option<&Upload>, image_only: bool) {
    let Some(upload) = upload else {
        return;
    };
    if upload.is_empty() {
        errors.add(field, "The selected file is empty.");
    } else if image_only && !upload.content_type.starts_with("image/") {
        errors.add(field, "Choose an image file.");
    }
}

pub fn login(email_address: &str, password: &str) -> Checked {
    let mut errors = FieldErrors::new();
    email(&mut errors, email_address);
    required(&mut errors, "password", password);
    finish(errors)
}

pub fn register(name: &str, email_address: &str, password: &str) -> Checked {
    let mut errors = FieldErrors::new();
    required(&mut errors, "name", name);
    max_len(&mut errors, "name", name, MAX_NAME_LEN);
    email(&mut errors, email_address);
    required(&mut errors, "password", password);
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.add(
            "password",
            format!("Use at least {MIN_PASSWORD_LEN} characters."),
        );
    }
    finish(errors)
}

pub fn profile_update(name: &str, bio: &str, avatar: Option<&Upload>) -> Checked {
    let mut errors = FieldErrors::new();
    required(&mut errors, "name", name);
    max_len(&mut errors, "name", name, MAX_NAME_LEN);
    max_len(&mut errors, "bio", bio, MAX_BIO_LEN);
    file(&mut errors, "avatar", avatar, true);
    finish(errors)
}

pub fn post(title: &str, body: &str, image: Option<&Upload>) -> Checked {
    let mut errors = FieldErrors::new();
    required(&mut errors, "title", title);
    max_len(&mut errors, "title", title, MAX_TITLE_LEN);
    required(&mut errors, "body", body);
    file(&mut errors, "image", image, true);
    finish(errors)
}

/// A comment needs text, an attachment, or both.
pub fn comment(text: &str, attachment: Option<&Upload>) -> Checked {
    let mut errors = FieldErrors::new();
    if attachment.is_none() {
        required(&mut errors, "text", text);
    }
    max_len(&mut errors, "text", text, MAX_COMMENT_LEN);
    file(&mut errors, "attachment", attachment, false);
    finish(errors)
}

pub fn ticket(subject: &str, body: &str) -> Checked {
    let mut errors = FieldErrors::new();
    required(&mut errors, "subject", subject);
    max_len(&mut errors, "subject", subject, MAX_SUBJECT_LEN);
    required(&mut errors, "body", body);
    finish(errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_requires_both_fields() {
        let errors = login("", "").unwrap_err();
        assert!(errors.get("email").is_some());
        assert!(errors.get("password").is_some());
        assert!(login("ada@example.com", "pw").is_ok());
    }

    #[test]
    fn malformed_email() {
        let errors = login("ada.example.com", "pw").unwrap_err();
        assert_eq!(errors.get("email"), Some("Enter a valid email address."));
    }

    #[test]
    fn register_enforces_password_length() {
        let errors = register("Ada", "ada@example.com", "short").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.get("password").is_some());
    }

    #[test]
    fn avatar_must_be_an_image() {
        let pdf = Upload::new("cv.pdf", "application/pdf", vec![1, 2, 3]);
        let errors = profile_update("Ada", "", Some(&pdf)).unwrap_err();
        assert_eq!(errors.get("avatar"), Some("Choose an image file."));
    }

    #[test]
    fn attachment_only_comment_is_fine() {
        let file = Upload::new("log.txt", "text/plain", b"boom".to_vec());
        assert!(comment("", Some(&file)).is_ok());
        assert!(comment("  ", None).is_err());
    }

    #[test]
    fn ticket_fields() {
        assert!(ticket("Help", "It broke").is_ok());
        let errors = ticket(&"x".repeat(151), "").unwrap_err();
        assert!(errors.get("subject").is_some());
        assert!(errors.get("body").is_some());
    }
}
