// src/bot/messages.rs
use crate::catalog::RecordSet;

pub const WELCOME: &str = "\
🎓 Добро пожаловать в бот поиска образовательных программ!

Отправьте мне шифр специальности (например: \"4S03220203\"), и я найду все подходящие образовательные программы.

Команды:
/start - Показать это сообщение
/help - Помощь
/status - Проверить статус бота

Просто отправьте шифр специальности для поиска!";

pub const HELP: &str = "\
📚 Как использовать данного бота:

1. Отправьте шифр специальности
2. Бот найдет все соответствующие образовательные программы
3. Бот сформулирует ответ для абитуриента и отправит его в следующем формате: Код программы - Название программы + Перечень документов

Примеры запросов:
• 070107 3
• 4S03220203
• 5AB02140101

❗ Убедитесь, что шифр написан правильно!";

pub const ERROR: &str = "😔 Произошла ошибка при обработке вашего запроса. \
Пожалуйста, попробуйте еще раз или обратитесь к администратору.";

const NOT_LOADED: &str = "❌ Данные не загружены. Обратитесь к администратору.";

const ADMISSION_INTRO: &str = "Вы можете поступить в наш университет по данным ГОП:";

const DOCUMENTS: &str = "\
Список необходимых документов:
1. Диплом с приложением (оригинал + копия)
2. Сертификат ЕНТ при сдаче.
3. Копия удостоверения личности.
4. Медицинская справка формы 075-у со снимком флюрографии.
5. Медицинская справка формы 063 (паспорт здоровья).
6. Фотография 3х4 в электронном формате.";

const INFO_LINK: &str =
    "Для дополнительной информации: https://www.ektu.kz/admissiondetails.aspx?ttab=1";

pub fn status(records: &RecordSet) -> String {
    if records.is_empty() {
        return NOT_LOADED.to_string();
    }
    let source = records
        .source()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| records.source().display().to_string());
    format!(
        "✅ Бот работает нормально\n📊 Загружено записей: {}\n📁 Источник: {}\n🕒 Данные загружены: {}",
        records.count(),
        source,
        records.loaded_at().format("%Y-%m-%d %H:%M UTC")
    )
}

/// Search results as legacy Markdown: escaped header, one code block with the
/// programs and the document checklist, then the total.
pub fn found(query: &str, lines: &[String]) -> String {
    let programs = lines
        .iter()
        .map(|l| strip_backticks(l))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Найденные программы для шифра '{}':\n\n```\n{}\n{}\n\n{}\n\n{}```\n\nВсего найдено: {} программ(ы)",
        escape_markdown(query),
        ADMISSION_INTRO,
        programs,
        DOCUMENTS,
        INFO_LINK,
        lines.len()
    )
}

pub fn not_found(query: &str) -> String {
    format!(
        "❌ Не найдено программ для шифра '{}'\n\nПроверьте правильность написания шифра.\n\nЕсли данная ошибка повторяется, то у нас нет ГОП по данному шифру",
        escape_markdown(query)
    )
}

/// Backslash-escape the characters legacy Markdown treats as entity markers.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

// A backtick inside a pre block would close it early.
fn strip_backticks(text: &str) -> String {
    text.replace('`', "'")
}
