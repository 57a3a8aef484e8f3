// Prompts for résumé enrichment and reformatting.
// Templates use {placeholder} syntax, filled with llm_client::prompts::fill.

/// Empty résumé schema the parser must fill in.
pub const RESUME_SCHEMA: &str = r#"{
  "personal_data": {
    "name": "", "email": "", "phone": "", "location": "", "linkedin": "", "portfolio": ""
  },
  "experiences": [
    {
      "company": "", "position": "", "start_date": "", "end_date": "", "location": "",
      "responsibilities": [], "achievements": []
    }
  ],
  "projects": [
    { "name": "", "description": "", "technologies": [], "start_date": "", "end_date": "", "url": "" }
  ],
  "skills": { "technical": [], "soft": [], "languages": [], "tools": [] },
  "research_work": [
    { "title": "", "description": "", "publication_date": "", "url": "", "collaborators": [] }
  ],
  "achievements": [
    { "title": "", "description": "", "date": "", "organization": "" }
  ],
  "education": [
    {
      "institution": "", "degree": "", "field_of_study": "", "start_date": "", "end_date": "",
      "gpa": "", "location": ""
    }
  ]
}"#;

pub const RESUME_PARSE_PROMPT_TEMPLATE: &str = r#"Convert the resume text below into exactly the JSON schema that follows.

Rules:
- Output no extra fields and no commentary.
- Never make up a value. Leave a field empty when the resume does not state it.
- Use "Present" when an end date is ongoing.
- Write dates as YYYY-MM-DD when possible.
- Output raw JSON only, without Markdown.

Schema:
{schema}

Resume:
{resume_text}"#;

pub const KEYWORD_PROMPT_TEMPLATE: &str = r#"Extract the relevant keywords from the resume text below. Cover:
- Technical skills
- Job titles and roles
- Industry terms
- Tools and technologies
- Soft skills
- Certifications

Return only a JSON object of this shape:
{"extracted_keywords": ["keyword1", "keyword2"]}

Resume:
{resume_text}"#;

pub const REFORMAT_SYSTEM_TEMPLATE: &str = r#"You are an expert resume formatter. Rewrite the resume you are given to follow the requested template while keeping every fact.

Rules:
1. Keep all dates, names, companies and factual details exactly as written.
2. Improve formatting, structure and presentation.
3. Make the language professional and concise.
4. Add suitable sections and headings.
5. Use bullet points where they help.
6. Never invent information.
7. Follow the requested template style.

Template ({template_name}) instructions: {prompt}"#;

pub const REFORMAT_PROMPT_TEMPLATE: &str = "Please reformat this resume:\n\n{resume_text}";
