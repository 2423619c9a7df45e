//! System and user prompts, in both languages.

use kapsul_core::locale::Language;

use crate::types::RiskQuestionnaire;

const RISK_SYSTEM_FA: &str = "\
شما مشاور ایمنی حریق هستید و ریسک حریق ساختمان‌ها را بر پایه استانداردهای NFPA و مقررات ملی ایران ارزیابی می‌کنید.

در هر ارزیابی:
1. سطح ریسک را یکی از low یا medium یا high تعیین کنید.
2. تجهیزات اطفاء لازم را با توجه به نوع فعالیت، مواد موجود و ابعاد ساختمان فهرست کنید.
3. تعداد و ظرفیت هر تجهیز را بر اساس محاسبات استاندارد بنویسید.
4. محل نصب مناسب هر تجهیز را پیشنهاد دهید.

پاسخ را فقط به صورت یک شیء JSON و متن‌ها را به فارسی با این ساختار برگردانید:
{
  \"riskLevel\": \"low|medium|high\",
  \"summary\": \"خلاصه ارزیابی\",
  \"recommendations\": [
    {
      \"equipment\": \"نام تجهیز، مثلاً کپسول پودری ۶ کیلوگرمی\",
      \"quantity\": \"تعداد\",
      \"reason\": \"علت نیاز\",
      \"location\": \"محل نصب پیشنهادی\"
    }
  ],
  \"additionalNotes\": \"توصیه‌های تکمیلی\"
}";

const RISK_SYSTEM_EN: &str = "\
You are a fire-safety consultant who assesses building fire risk against NFPA standards and Iranian national regulations.

For each assessment:
1. Rate the risk as low, medium or high.
2. List the suppression equipment needed for the activity, the materials on site and the building size.
3. Give the quantity and capacity of each item from standard calculations.
4. Suggest where each item should be installed.

Reply with a single JSON object only, written in English, shaped like this:
{
  \"riskLevel\": \"low|medium|high\",
  \"summary\": \"Assessment summary\",
  \"recommendations\": [
    {
      \"equipment\": \"Item name, e.g. 6 kg powder extinguisher\",
      \"quantity\": \"How many\",
      \"reason\": \"Why it is needed\",
      \"location\": \"Suggested installation point\"
    }
  ],
  \"additionalNotes\": \"Further safety advice\"
}";

const CHAT_SYSTEM_FA: &str = "\
شما کارشناس ایمنی و اطفاء حریق هستید و در این زمینه‌ها تخصص دارید:
- استانداردهای NFPA و استانداردهای ملی ایران
- انواع کپسول‌ها (پودری، دی اکسید کربن، فوم، آبی) و نگهداری و شارژ آن‌ها
- سامانه‌های خودکار اطفاء و اعلام حریق
- ارزیابی ریسک و ایمنی صنعتی

به پرسش‌ها دقیق و کاربردی پاسخ دهید، در انتخاب تجهیزات راهنمایی کنید و مقررات را توضیح دهید. همیشه به فارسی پاسخ دهید.";

const CHAT_SYSTEM_EN: &str = "\
You are a fire-safety and suppression expert with knowledge of:
- NFPA standards and Iranian national standards
- Extinguisher types (powder, CO2, foam, water) and their maintenance and recharge
- Automatic suppression and fire alarm systems
- Risk assessment and industrial safety

Answer questions accurately and practically, help choose equipment and explain the regulations. Always reply in English.";

pub(crate) fn risk_system(lang: Language) -> &'static str { lang.pick(RISK_SYSTEM_FA, RISK_SYSTEM_EN) }

pub(crate) fn chat_system(lang: Language) -> &'static str { lang.pick(CHAT_SYSTEM_FA, CHAT_SYSTEM_EN) }

/// Render the questionnaire. Blank optional fields read as "none".
pub(crate) fn risk_user(q: &RiskQuestionnaire) -> String {
  let lang = q.language;
  let none = lang.pick("ندارد", "None");
  let or_none = |value: &str| {
    let value = value.trim();
    if value.is_empty() { none.to_owned() } else { value.to_owned() }
  };

  let mut lines = match lang {
    Language::Fa => vec![
      "ریسک حریق را بر اساس اطلاعات زیر ارزیابی کنید:".to_owned(),
      String::new(),
      format!("نوع فعالیت: {}", q.industry_type.trim()),
      format!("مساحت ساختمان: {} متر مربع", q.building_size.trim()),
      format!("تعداد طبقات: {}", q.floor_count.trim()),
      format!("تعداد کارکنان: {}", q.employee_count.trim()),
      format!("تجهیزات و ماشین‌آلات: {}", q.equipment.trim()),
      format!("مواد خطرناک: {}", or_none(&q.hazardous_materials)),
      format!("تجهیزات اطفاء موجود: {}", or_none(&q.existing_equipment)),
    ],
    Language::En => vec![
      "Assess the fire risk for the following site:".to_owned(),
      String::new(),
      format!("Industry type: {}", q.industry_type.trim()),
      format!("Building size: {} sqm", q.building_size.trim()),
      format!("Floors: {}", q.floor_count.trim()),
      format!("Employees: {}", q.employee_count.trim()),
      format!("Equipment and machinery: {}", q.equipment.trim()),
      format!("Hazardous materials: {}", or_none(&q.hazardous_materials)),
      format!("Existing equipment: {}", or_none(&q.existing_equipment)),
    ],
  };

  let extra = q.additional_info.trim();
  if !extra.is_empty() {
    lines.push(format!("{}: {extra}", lang.pick("اطلاعات تکمیلی", "Additional info")));
  }
  lines.push(String::new());
  lines.push(
    lang
      .pick("لطفاً ارزیابی کامل و دقیق ارائه دهید.", "Please give a complete and accurate assessment.")
      .to_owned(),
  );
  lines.join("\n")
}

#[cfg(test)]
mod tests {
  use super::*;

  fn questionnaire(lang: Language) -> RiskQuestionnaire {
    RiskQuestionnaire {
      industry_type: "Warehouse".into(),
      building_size: "1200".into(),
      floor_count: "2".into(),
      employee_count: "35".into(),
      equipment: "Forklifts".into(),
      language: lang,
      ..Default::default()
    }
  }

  #[test]
  fn blank_optional_fields_read_as_none() {
    let text = risk_user(&questionnaire(Language::En));
    assert!(text.contains("Hazardous materials: None"));
    assert!(text.contains("Existing equipment: None"));
    assert!(!text.contains("Additional info"));

    let text = risk_user(&questionnaire(Language::Fa));
    assert!(text.contains("مواد خطرناک: ندارد"));
  }

  #[test]
  fn additional_info_is_appended_when_given() {
    let mut q = questionnaire(Language::En);
    q.additional_info = "Paint store on floor 2".into();
    q.hazardous_materials = "Solvents".into();
    let text = risk_user(&q);
    assert!(text.contains("Hazardous materials: Solvents"));
    assert!(text.contains("Additional info: Paint store on floor 2"));
    assert!(text.contains("Building size: 1200 sqm"));
  }

  #[test]
  fn risk_prompt_demands_json() {
    assert!(risk_system(Language::En).contains("single JSON object"));
    assert!(risk_system(Language::Fa).contains("JSON"));
  }
}
