//! # Daily Prompt Module
//!
//! Builds the system instructions sent as the first turn of every session.
//! The instructions combine a static patient profile with a menu and activity
//! suggestion that changes with the calendar date.
//!
//! The daily suggestion is drawn from a generator seeded with the date as
//! `YYYYMMDD`. A fresh generator is created on every call, so the same date
//! always yields the same prompt and no other randomness in the process is
//! affected.

use chrono::{DateTime, Datelike, Local, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

pub const HEALTH_ISSUES: [&str; 9] = [
    "Нарушения в опорно-двигательной системе",
    "Нарушения в лимфатической системе",
    "Дегенеративно-дистрофические изменения позвоночника",
    "Нарушение водно-электролитного баланса",
    "Жировая инфильтрация печени",
    "Дефицит цинка",
    "Атеросклеротические бляшки",
    "Недостаточность пищеварения",
    "Дефицит аминокислот",
];

pub const DIETARY_RECOMMENDATIONS: [&str; 8] = [
    "Исключить сладости и кондитерские изделия",
    "Основа рациона: тушеные овощи и салаты",
    "Рекомендуемые овощи: морковь, свекла, цветная капуста",
    "Морепродукты: рыба, морская капуста",
    "Белки: птица, рыба, нежирные сорта мяса",
    "Орехи и семена",
    "Фрукты: апельсины, персики, абрикосы",
    "Продукты с витаминами А и Е",
];

pub const CONTRAINDICATIONS: [&str; 3] = [
    "Повышенные нагрузки на позвоночник",
    "Длительное пребывание в некачественных помещениях",
    "Иррациональный график питания",
];

pub const KEY_PRIORITIES: [&str; 5] = [
    "Укрепление позвоночника и суставов",
    "Нормализация водно-электролитного баланса",
    "Восполнение дефицита аминокислот и витаминов",
    "Поддержка сердечно-сосудистой системы",
    "Контроль веса при замедленном метаболизме",
];

pub const BREAKFAST_OPTIONS: [&str; 4] = [
    "овсяная каша с орехами и абрикосами",
    "омлет с цветной капустой",
    "творог с морковным салатом",
    "гречневая каша с тушеными овощами",
];

pub const LUNCH_OPTIONS: [&str; 4] = [
    "запеченная рыба с тушеной свеклой",
    "куриная грудка с салатом из морской капусты",
    "тушеная индейка с цветной капустой",
    "рыбные котлеты с морковным пюре",
];

pub const DINNER_OPTIONS: [&str; 4] = [
    "овощной салат с орехами",
    "тушеные овощи с семенами",
    "легкий суп с морской капустой",
    "салат из свеклы с грецкими орехами",
];

pub const ACTIVITY_OPTIONS: [&str; 5] = [
    "легкая прогулка на свежем воздухе 20-30 минут",
    "растяжка для позвоночника (5-10 минут)",
    "дыхательные упражнения",
    "легкие упражнения для суставов",
    "плавание или аквааэробика (если есть возможность)",
];

const SPECIAL_INSTRUCTIONS: [&str; 9] = [
    "Все рекомендации должны учитывать возраст и текущее состояние здоровья",
    "Предлагать щадящие физические нагрузки",
    "Особое внимание уделять продуктам, богатым недостающими аминокислотами",
    "Контроль калорийности из-за замедленного метаболизма",
    "Акцент на противовоспалительные продукты",
    "Отвечать подробно, но понятно для человека старшего возраста",
    "Использовать смайлики для поддержки 😊",
    "Учитывать день недели при составлении рекомендаций",
    "Варьировать советы в зависимости от дня",
];

/// Menu and activity suggestion for one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyVariant {
    pub breakfast: &'static str,
    pub lunch: &'static str,
    pub dinner: &'static str,
    pub activity: &'static str,
}

impl DailyVariant {
    /// Draw the variant for `date`.
    ///
    /// The draw order (breakfast, lunch, dinner, activity) is part of the
    /// contract: changing it changes every day's suggestion.
    pub fn for_date(date: NaiveDate) -> Self {
        let mut rng = StdRng::seed_from_u64(date_seed(date));
        Self {
            breakfast: pick(&mut rng, &BREAKFAST_OPTIONS),
            lunch: pick(&mut rng, &LUNCH_OPTIONS),
            dinner: pick(&mut rng, &DINNER_OPTIONS),
            activity: pick(&mut rng, &ACTIVITY_OPTIONS),
        }
    }
}

/// Integer `YYYYMMDD` form of a date
pub fn date_seed(date: NaiveDate) -> u64 {
    let year = u64::try_from(date.year()).unwrap_or(0);
    year * 10_000 + u64::from(date.month()) * 100 + u64::from(date.day())
}

fn pick(rng: &mut StdRng, options: &[&'static str]) -> &'static str {
    options.choose(rng).copied().unwrap_or_default()
}

/// Russian name of a weekday, as used in prompts and keyboard labels
pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "понедельник",
        Weekday::Tue => "вторник",
        Weekday::Wed => "среда",
        Weekday::Thu => "четверг",
        Weekday::Fri => "пятница",
        Weekday::Sat => "суббота",
        Weekday::Sun => "воскресенье",
    }
}

/// Generate the system prompt for the local calendar date of `now`
pub fn system_prompt_for(now: DateTime<Local>) -> String {
    generate_system_prompt(now.date_naive())
}

/// Generate the system prompt for `date`
pub fn generate_system_prompt(date: NaiveDate) -> String {
    let day = weekday_name(date.weekday());
    let variant = DailyVariant::for_date(date);

    let mut prompt = format!(
        "Ты - персональный ассистент-нутрициолог для пациента старшего возраста. \
         Сегодня {day}, {}. \
         Основываясь на медицинском отчете, давай научно обоснованные рекомендации по питанию и образу жизни. ",
        date.format("%d.%m.%Y")
    );

    push_section(&mut prompt, "Ключевые особенности здоровья пациента", &HEALTH_ISSUES);
    push_section(&mut prompt, "Диетические рекомендации", &DIETARY_RECOMMENDATIONS);
    push_section(&mut prompt, "Приоритеты в питании", &KEY_PRIORITIES);
    push_section(&mut prompt, "Противопоказания", &CONTRAINDICATIONS);

    prompt.push_str(&format!(
        "Рекомендации на сегодня ({day}):\n  • Завтрак: {}\n  • Обед: {}\n  • Ужин: {}\n  • Активность: {}\n\n",
        variant.breakfast, variant.lunch, variant.dinner, variant.activity
    ));

    prompt.push_str("Особые указания:\n");
    let instructions: Vec<String> = SPECIAL_INSTRUCTIONS
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{}. {}", i + 1, line))
        .collect();
    prompt.push_str(&instructions.join("\n"));

    prompt
}

fn push_section(prompt: &mut String, title: &str, items: &[&str]) {
    prompt.push_str(title);
    prompt.push_str(":\n");
    for item in items {
        prompt.push_str("  • ");
        prompt.push_str(item);
        prompt.push('\n');
    }
    prompt.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_date_seed() {
        assert_eq!(date_seed(date(2024, 3, 9)), 20240309);
        assert_eq!(date_seed(date(1999, 12, 31)), 19991231);
    }

    #[test]
    fn test_variant_comes_from_option_lists() {
        let variant = DailyVariant::for_date(date(2024, 5, 17));
        assert!(BREAKFAST_OPTIONS.contains(&variant.breakfast));
        assert!(LUNCH_OPTIONS.contains(&variant.lunch));
        assert!(DINNER_OPTIONS.contains(&variant.dinner));
        assert!(ACTIVITY_OPTIONS.contains(&variant.activity));
    }

    #[test]
    fn test_weekday_names() {
        assert_eq!(weekday_name(Weekday::Mon), "понедельник");
        assert_eq!(weekday_name(Weekday::Sun), "воскресенье");
    }

    #[test]
    fn test_prompt_sections_in_order() {
        let prompt = generate_system_prompt(date(2024, 5, 17));
        let issues = prompt.find("Ключевые особенности здоровья пациента:").unwrap();
        let diet = prompt.find("Диетические рекомендации:").unwrap();
        let priorities = prompt.find("Приоритеты в питании:").unwrap();
        let contra = prompt.find("Противопоказания:").unwrap();
        let today = prompt.find("Рекомендации на сегодня (пятница):").unwrap();
        let special = prompt.find("Особые указания:").unwrap();
        assert!(issues < diet && diet < priorities && priorities < contra);
        assert!(contra < today && today < special);
        assert!(prompt.contains("Сегодня пятница, 17.05.2024."));
        assert!(prompt.ends_with("9. Варьировать советы в зависимости от дня"));
    }
}
