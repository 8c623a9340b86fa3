//! Classification prompts.
//!
//! One prompt per batch attempt. The text is a pure function of the target,
//! the batch values and the attempt number.

use super::taxonomy::TaxonomyEntry;
use super::types::{ClassificationTarget, TargetKind, CATCH_ALL_LABEL};

/// Warning appended on resubmission rounds (attempt > 0).
const RETRY_WARNING: &str =
    "⚠️ ВНИМАНИЕ: Эти значения НЕ УДАЛОСЬ классифицировать с первой попытки! Будь более внимательным!";

/// Render the classification request for one batch.
pub fn build_prompt(target: &ClassificationTarget, batch: &[String], attempt: u32) -> String {
    match target.kind {
        TargetKind::Title => title_prompt(target, batch, attempt),
        TargetKind::FieldOfActivity => field_prompt(target, batch, attempt),
    }
}

fn title_prompt(target: &ClassificationTarget, batch: &[String], attempt: u32) -> String {
    let rules = [
        "НЕ придумывай новые категории".to_string(),
        format!("Если не уверен — ставь \"{CATCH_ALL_LABEL}\""),
        "Вакансии пиши с большой буквы (как в примере)".to_string(),
        "НЕ добавляй объяснений, комментариев или примеров.".to_string(),
    ];

    format!(
        "Ты — HR-аналитик, классифицируешь вакансии.\n\n\
Исходные названия: {values}.\n\n\
Приведи каждое название к одной из категорий:\n\n\
{categories}\n\n\
**Правила**\n\
{rules}\n\n\
Верни ТОЛЬКО JSON-массив, где каждый элемент — объект с полями:\n\
- \"original\": исходная строка\n\
- \"{label}\": выбранная категория\n",
        values = batch.join(", "),
        categories = format_categories(target.taxonomy),
        rules = format_rules(&rules, attempt),
        label = target.label_field,
    )
}

fn field_prompt(target: &ClassificationTarget, batch: &[String], attempt: u32) -> String {
    let rules = [
        "Выбери ОДНУ основную категорию из списка выше".to_string(),
        "Для специализации — укажи самое конкретное из названия".to_string(),
        format!("Если сомневаешься — ставь категорию \"{CATCH_ALL_LABEL}\""),
        "Категории и специализации пиши с большой буквы".to_string(),
        "В скобках указаны условия для анализа (записывать их в ответ не нужно)".to_string(),
        "НЕ придумывай новые категории и НЕ добавляй объяснений.".to_string(),
    ];
    let secondary = target.secondary_field.unwrap_or("specialization");

    format!(
        "Ты — HR-аналитик, классифицируешь вакансии.\n\
Исходные сферы деятельности: {values}.\n\n\
**КАТЕГОРИИ (выбери ОДНУ):**\n\
{categories}\n\n\
**ПРАВИЛА (попытка #{attempt_no}):**\n\
{rules}\n\n\
**ВНИМАНИЕ:** Если сфера СЛОЖНАЯ (несколько направлений перечислены через \".\" или \"/\"):\n\
1. Выбери ПЕРВУЮ или ОСНОВНУЮ сферу\n\
2. Игнорируй второстепенные\n\
3. Если сомневаешься — ставь \"{CATCH_ALL_LABEL}\"\n\n\
Верни ТОЛЬКО JSON-массив, где каждый элемент — объект с полями:\n\
- \"original\": исходная строка\n\
- \"{label}\": широкая категория (с большой буквы)\n\
- \"{secondary}\": узкая специализация (с большой буквы)\n",
        values = batch.join(", "),
        categories = format_categories(target.taxonomy),
        attempt_no = attempt + 1,
        rules = format_rules(&rules, attempt),
        label = target.label_field,
    )
}

/// Bulleted category list; hints go in parentheses.
fn format_categories(taxonomy: &[TaxonomyEntry]) -> String {
    taxonomy
        .iter()
        .map(|e| match e.hint {
            Some(hint) => format!("- {} (если содержит: {hint})", e.label),
            None => format!("- {}", e.label),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Numbered rules, with the retry warning as the last rule on resubmissions.
fn format_rules(rules: &[String], attempt: u32) -> String {
    let warning = (attempt > 0).then_some(RETRY_WARNING);
    rules
        .iter()
        .map(String::as_str)
        .chain(warning)
        .enumerate()
        .map(|(i, rule)| format!("{}. {rule}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}
