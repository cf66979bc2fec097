//! Payment confirmation email.

use crate::domain::foundation::{GroupNumber, Money, SubjectId};
use crate::ports::EmailMessage;

/// Display label for a subject: `"<n>º Período"` when the id carries a
/// period number, the raw id otherwise.
pub fn subject_label(subject_id: &SubjectId) -> String {
    let digits: String = subject_id.as_str().chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        subject_id.to_string()
    } else {
        format!("{}º Período", digits)
    }
}

pub fn confirmation_email(
    to: &str,
    first_name: Option<&str>,
    subject_id: &SubjectId,
    group: GroupNumber,
    amount: Money,
    app_url: &str,
) -> EmailMessage {
    let label = subject_label(subject_id);
    let name = first_name.unwrap_or("aluno(a)");
    let html = format!(
        r#"<!DOCTYPE html>
<html><head><meta charset="utf-8"/></head>
<body style="margin:0;padding:24px;background:#F1F5F9;font-family:system-ui,sans-serif">
<div style="max-width:520px;margin:0 auto;background:#fff;border-radius:12px;padding:24px">
  <h2 style="margin:0 0 16px;color:#0F172A">Pagamento Confirmado</h2>
  <p>Olá, <strong>{name}</strong>!</p>
  <p>Seu pagamento foi confirmado e seu acesso já está liberado.</p>
  <table width="100%" style="background:#F0FDF4;border-radius:10px;padding:12px">
    <tr><td>Período:</td><td align="right"><strong>{label}</strong></td></tr>
    <tr><td>Grupo:</td><td align="right"><strong>{group}</strong></td></tr>
    <tr><td>Valor:</td><td align="right"><strong>R$ {amount}</strong></td></tr>
  </table>
  <p style="text-align:center;margin-top:20px">
    <a href="{app_url}" style="background:#0F172A;color:#fff;padding:12px 32px;border-radius:8px;text-decoration:none">Acessar meu cronograma</a>
  </p>
</div>
</body></html>"#
    );

    EmailMessage {
        to: to.to_string(),
        subject: format!("Pagamento confirmado - {}", label),
        html,
    }
}
