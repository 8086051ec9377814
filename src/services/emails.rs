// Contenu des emails membres, en français ou en anglais selon la langue du membre

use crate::models::members::{self, Language};
use crate::services::mailer::{EmailKind, OutgoingEmail};

fn link(frontend_url: &str, language: Language, path: &str, token: &str) -> String {
    format!("{}/{}/{}?token={}", frontend_url, language.code(), path, token)
}

pub fn verification(member: &members::Model, frontend_url: &str, token: &str) -> OutgoingEmail {
    let url = link(frontend_url, member.preferred_language, "verify-email", token);
    let (subject, body) = match member.preferred_language {
        Language::Fr => (
            "Confirmez votre adresse email",
            format!(
                "Bonjour {},\n\nMerci pour votre inscription. Confirmez votre adresse en ouvrant ce lien (valable 24 heures) :\n{}\n\nSi vous n'êtes pas à l'origine de cette inscription, ignorez cet email.",
                member.name, url
            ),
        ),
        Language::En => (
            "Confirm your email address",
            format!(
                "Hello {},\n\nThanks for signing up. Confirm your address by opening this link (valid for 24 hours):\n{}\n\nIf you did not sign up, you can ignore this email.",
                member.name, url
            ),
        ),
    };

    OutgoingEmail {
        kind: EmailKind::Verification,
        to: member.email.clone(),
        subject: subject.to_string(),
        body,
    }
}

pub fn welcome(member: &members::Model, frontend_url: &str) -> OutgoingEmail {
    let (subject, body) = match member.preferred_language {
        Language::Fr => (
            "Bienvenue !",
            format!(
                "Bonjour {},\n\nVotre compte est prêt. Retrouvez vos favoris et votre historique de lecture sur {}/fr.",
                member.name, frontend_url
            ),
        ),
        Language::En => (
            "Welcome!",
            format!(
                "Hello {},\n\nYour account is ready. Find your favorites and reading history at {}/en.",
                member.name, frontend_url
            ),
        ),
    };

    OutgoingEmail {
        kind: EmailKind::Welcome,
        to: member.email.clone(),
        subject: subject.to_string(),
        body,
    }
}

pub fn password_reset(member: &members::Model, frontend_url: &str, token: &str) -> OutgoingEmail {
    let url = link(frontend_url, member.preferred_language, "reset-password", token);
    let (subject, body) = match member.preferred_language {
        Language::Fr => (
            "Réinitialisation de votre mot de passe",
            format!(
                "Bonjour {},\n\nPour choisir un nouveau mot de passe, ouvrez ce lien (valable 1 heure) :\n{}\n\nSi vous n'avez rien demandé, ignorez cet email : votre mot de passe reste inchangé.",
                member.name, url
            ),
        ),
        Language::En => (
            "Reset your password",
            format!(
                "Hello {},\n\nTo choose a new password, open this link (valid for 1 hour):\n{}\n\nIf you did not request this, ignore this email: your password stays the same.",
                member.name, url
            ),
        ),
    };

    OutgoingEmail {
        kind: EmailKind::PasswordReset,
        to: member.email.clone(),
        subject: subject.to_string(),
        body,
    }
}

pub fn password_changed(member: &members::Model) -> OutgoingEmail {
    let (subject, body) = match member.preferred_language {
        Language::Fr => (
            "Votre mot de passe a été modifié",
            format!(
                "Bonjour {},\n\nLe mot de passe de votre compte vient d'être modifié. Si ce n'est pas vous, réinitialisez-le immédiatement.",
                member.name
            ),
        ),
        Language::En => (
            "Your password was changed",
            format!(
                "Hello {},\n\nYour account password was just changed. If this wasn't you, reset it immediately.",
                member.name
            ),
        ),
    };

    OutgoingEmail {
        kind: EmailKind::PasswordChanged,
        to: member.email.clone(),
        subject: subject.to_string(),
        body,
    }
}
