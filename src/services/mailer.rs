//! Envoi des emails membres.
//!
//! Les flux (inscription, reset...) ne font que déposer un email dans la file
//! de l'`EmailDispatcher`; une tâche de fond l'envoie via le `Mailer`. Un échec
//! est journalisé et conservé dans la file des emails en échec, jamais remonté
//! à l'appelant.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::config::{AppConfig, SmtpConfig};

const DEAD_LETTER_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailKind {
    Verification,
    Welcome,
    PasswordReset,
    PasswordChanged,
}

#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub kind: EmailKind,
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct FailedEmail {
    pub email: OutgoingEmail,
    pub error: String,
    pub failed_at: DateTime<Utc>,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), String>;
}

/// Envoi SMTP (STARTTLS)
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(smtp: &SmtpConfig, from: &str) -> Result<Self, String> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
            .map_err(|e| format!("Invalid SMTP relay {}: {}", smtp.host, e))?
            .port(smtp.port);

        if let (Some(username), Some(password)) = (&smtp.username, &smtp.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from: from.to_string(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), String> {
        let message = Message::builder()
            .from(self.from.parse().map_err(|e| format!("Invalid sender: {}", e))?)
            .to(email.to.parse().map_err(|e| format!("Invalid recipient: {}", e))?)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())
            .map_err(|e| format!("Failed to build email: {}", e))?;

        self.transport
            .send(message)
            .await
            .map(|_| ())
            .map_err(|e| format!("SMTP error: {}", e))
    }
}

/// Développement sans SMTP: l'email est seulement journalisé (sans son contenu)
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), String> {
        log::info!("📧 [{:?}] email to {} not sent (SMTP not configured): {}", email.kind, email.to, email.subject);
        Ok(())
    }
}

pub fn mailer_from_config(config: &AppConfig) -> Result<Arc<dyn Mailer>, String> {
    match &config.smtp {
        Some(smtp) => Ok(Arc::new(SmtpMailer::new(smtp, &config.mail_from)?)),
        None => {
            log::warn!("⚠️  SMTP_HOST not set, emails will only be logged");
            Ok(Arc::new(LogMailer))
        }
    }
}

/// File d'envoi asynchrone
#[derive(Clone)]
pub struct EmailDispatcher {
    sender: mpsc::UnboundedSender<OutgoingEmail>,
    failures: Arc<Mutex<VecDeque<FailedEmail>>>,
}

impl EmailDispatcher {
    /// Démarre la tâche d'envoi (doit être appelé dans un runtime tokio)
    pub fn start(mailer: Arc<dyn Mailer>) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<OutgoingEmail>();
        let failures = Arc::new(Mutex::new(VecDeque::new()));
        let dead_letters = failures.clone();

        tokio::spawn(async move {
            while let Some(email) = receiver.recv().await {
                match mailer.send(&email).await {
                    Ok(()) => log::debug!("Email {:?} sent to {}", email.kind, email.to),
                    Err(error) => {
                        log::error!("Failed to send {:?} email to {}: {}", email.kind, email.to, error);
                        let mut queue = dead_letters.lock();
                        if queue.len() == DEAD_LETTER_CAPACITY {
                            queue.pop_front();
                        }
                        queue.push_back(FailedEmail {
                            email,
                            error,
                            failed_at: Utc::now(),
                        });
                    }
                }
            }
        });

        Self { sender, failures }
    }

    /// Ne bloque jamais le flux appelant
    pub fn dispatch(&self, email: OutgoingEmail) {
        if let Err(e) = self.sender.send(email) {
            log::error!("Email queue closed, {:?} email to {} dropped", e.0.kind, e.0.to);
        }
    }

    pub fn failed(&self) -> Vec<FailedEmail> {
        self.failures.lock().iter().cloned().collect()
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// Mailer de test: garde les emails envoyés, peut simuler une panne
    #[derive(Default)]
    pub struct RecordingMailer {
        sent: Mutex<Vec<OutgoingEmail>>,
        failing: std::sync::atomic::AtomicBool,
    }

    impl RecordingMailer {
        pub fn failing() -> Self {
            let mailer = Self::default();
            mailer.failing.store(true, std::sync::atomic::Ordering::SeqCst);
            mailer
        }

        pub fn sent(&self) -> Vec<OutgoingEmail> {
            self.sent.lock().clone()
        }

        /// Attend que `count` emails aient été traités par la tâche d'envoi
        pub async fn wait_for(&self, count: usize) -> Vec<OutgoingEmail> {
            for _ in 0..200 {
                if self.sent.lock().len() >= count {
                    break;
                }
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
            self.sent()
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: &OutgoingEmail) -> Result<(), String> {
            self.sent.lock().push(email.clone());
            if self.failing.load(std::sync::atomic::Ordering::SeqCst) {
                return Err("connection refused".to_string());
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingMailer;
    use super::*;

    fn email(kind: EmailKind) -> OutgoingEmail {
        OutgoingEmail {
            kind,
            to: "ana@example.com".to_string(),
            subject: "Bienvenue".to_string(),
            body: "Bonjour".to_string(),
        }
    }

    #[actix_web::test]
    async fn test_dispatch_sends_in_background() {
        let mailer = Arc::new(RecordingMailer::default());
        let dispatcher = EmailDispatcher::start(mailer.clone());

        dispatcher.dispatch(email(EmailKind::Welcome));
        dispatcher.dispatch(email(EmailKind::Verification));

        let sent = mailer.wait_for(2).await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].kind, EmailKind::Welcome);
        assert!(dispatcher.failed().is_empty());
    }

    #[actix_web::test]
    async fn test_failures_are_kept() {
        let mailer = Arc::new(RecordingMailer::failing());
        let dispatcher = EmailDispatcher::start(mailer.clone());

        dispatcher.dispatch(email(EmailKind::PasswordReset));
        mailer.wait_for(1).await;

        let mut failed = dispatcher.failed();
        for _ in 0..100 {
            if !failed.is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            failed = dispatcher.failed();
        }
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].email.kind, EmailKind::PasswordReset);
        assert_eq!(failed[0].error, "connection refused");
    }
}
