use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use crate::models::SubmissionFields;
use crate::naming::SubmissionId;

pub const SUMMARY_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

const NOT_INFORMED: &str = "Não informado";
const NOT_INFORMED_DATE: &str = "Não informada";

pub struct SummaryContext<'a> {
    pub submission_id: &'a SubmissionId,
    pub fields: &'a SubmissionFields,
    pub file_urls: &'a [String],
    pub received_at: DateTime<Utc>,
}

fn or_placeholder<'a>(value: &'a Option<String>, placeholder: &'a str) -> &'a str {
    value.as_deref().unwrap_or(placeholder)
}

pub fn render_summary(ctx: &SummaryContext<'_>) -> String {
    let fields = ctx.fields;
    let timestamp = ctx.received_at.format("%d/%m/%Y às %H:%M:%S UTC");

    let links = if ctx.file_urls.is_empty() {
        "Nenhum arquivo anexado".to_string()
    } else {
        ctx.file_urls
            .iter()
            .enumerate()
            .map(|(idx, url)| format!("[{}] {url}", idx + 1))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let sections: [(&str, &str); 11] = [
        ("Dados do Consignee", or_placeholder(&fields.consignee_data, NOT_INFORMED)),
        ("Motivo da Solicitação", or_placeholder(&fields.request_reason, NOT_INFORMED)),
        ("BL / Container", or_placeholder(&fields.bl_container, NOT_INFORMED)),
        ("Container", or_placeholder(&fields.container_info, NOT_INFORMED)),
        ("Free Time Concedido", or_placeholder(&fields.free_time_granted, NOT_INFORMED)),
        ("Data da Descarga", or_placeholder(&fields.discharge_date, NOT_INFORMED_DATE)),
        (
            "Data da Primeira Tentativa da Devolução",
            or_placeholder(&fields.first_return_attempt_date, NOT_INFORMED_DATE),
        ),
        (
            "Data da Devolução do Container",
            or_placeholder(&fields.container_return_date, NOT_INFORMED_DATE),
        ),
        ("Terminal de Devolução", or_placeholder(&fields.return_terminal_city, NOT_INFORMED)),
        ("Links dos Arquivos Anexados", links.as_str()),
        ("Resumo da Ocorrência", or_placeholder(&fields.occurrence_summary, NOT_INFORMED)),
    ];

    let mut out = String::new();
    let _ = writeln!(out, "REGISTRO DE SOLICITAÇÃO DE DISPUTE");
    let _ = writeln!(out, "ID: {}", ctx.submission_id);
    let _ = writeln!(out, "Data de Recebimento: {timestamp}");
    let _ = writeln!(out, "===================================");
    for (idx, (label, value)) in sections.iter().enumerate() {
        let _ = write!(out, "\n{}. {label}:\n{value}\n", idx + 1);
    }
    out
}
