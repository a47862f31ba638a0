// Mails the HTML inventory report over SMTP. lettre's transport is blocking, so the
// send runs on the blocking pool.

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};
use tracing::info;

use crate::{
    config::MailConfig,
    report::{render_html, InventorySnapshot, ReportDispatcher, ReportError},
};

pub struct SmtpDispatcher {
    smtp_server: String,
    smtp_port: u16,
    credentials: Credentials,
    from: Mailbox,
    recipients: Vec<Mailbox>,
    subject: String,
}

impl SmtpDispatcher {
    // Addresses are parsed up front so a bad config fails before anything is sent
    pub fn new(config: &MailConfig) -> Result<Self, ReportError> {
        let from = parse_mailbox(&format!("{} <{}>", config.from_name, config.from_email))?;
        let recipients = config
            .recipients
            .iter()
            .map(|r| parse_mailbox(r))
            .collect::<Result<Vec<_>, _>>()?;
        if recipients.is_empty() {
            return Err(ReportError::Address("no recipients configured".to_string()));
        }

        Ok(Self {
            smtp_server: config.smtp_server.clone(),
            smtp_port: config.smtp_port,
            credentials: Credentials::new(config.username.clone(), config.password.clone()),
            from,
            recipients,
            subject: config.subject.clone(),
        })
    }

    pub fn build_message(&self, snapshot: &InventorySnapshot) -> Result<Message, ReportError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(self.subject.clone())
            .header(ContentType::TEXT_HTML);
        for recipient in &self.recipients {
            builder = builder.to(recipient.clone());
        }
        builder
            .body(render_html(snapshot)?)
            .map_err(|e| ReportError::Build(e.to_string()))
    }

    fn build_transport(&self) -> Result<SmtpTransport, ReportError> {
        Ok(SmtpTransport::relay(&self.smtp_server)
            .map_err(|e| ReportError::Transport(format!("SMTP relay error: {e}")))?
            .port(self.smtp_port)
            .credentials(self.credentials.clone())
            .build())
    }
}

#[async_trait]
impl ReportDispatcher for SmtpDispatcher {
    async fn dispatch(&self, snapshot: &InventorySnapshot) -> Result<(), ReportError> {
        let message = self.build_message(snapshot)?;
        let mailer = self.build_transport()?;

        tokio::task::spawn_blocking(move || {
            mailer
                .send(&message)
                .map_err(|e| ReportError::Transport(e.to_string()))
        })
        .await
        .map_err(|e| ReportError::Task(e.to_string()))??;

        info!(
            server = %self.smtp_server,
            recipients = self.recipients.len(),
            "report mailed"
        );
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, ReportError> {
    address
        .trim()
        .parse::<Mailbox>()
        .map_err(|e| ReportError::Address(format!("{address}: {e}")))
}
