use crate::parser::markers::{BEST_MONTHS_OPEN, FAQ_END, FAQ_START, REFS_END, REFS_START};
use crate::queue::{CountryProfile, WorkItem};

/// Generation prompt for one country. It asks for the markers the parser
/// reads and the headings the validator checks.
pub fn build_prompt(item: &WorkItem, profile: &CountryProfile, related: &[String], year: i32) -> String {
    let name = &item.name;
    let tourradar = &profile.tourradar_slug;
    let related = related.join(", ");

    format!(
        r#"Write a comprehensive travel guide titled "Best Time to Visit {name} ({year} Guide)".

IMPORTANT: Start your response with this exact marker on the first line:
{BEST_MONTHS_OPEN} Month1, Month2, Month3 -->
Replace Month1, Month2, Month3 with the actual best months to visit {name} (use full month names like January, February, etc.). List 2-5 months.

REQUIREMENTS:
- 2,500-3,500 words
- Write in first person as Elena Vasquez, senior travel editor
- Warm, authoritative, helpful tone
- Target keyword: "best time to visit {name}"
- Use the keyword naturally 4-6 times throughout the article

STRUCTURE (use these exact H2 headings):
## At a Glance
(Quick-reference table in markdown format with these rows: Best Months, Avg Temp, Peak Season, Budget Level, Currency.
Then 1 paragraph, 3-4 sentences, directly answering when is the best time to visit {name} and why.)

## Month-by-Month Weather Guide
(Cover all 12 months with temperature, rainfall, and what to expect. Use a markdown table with columns: Month | Temperature | Rainfall | Crowds | Rating)

## Best Time for Popular Activities
(H3 subheadings for 4-6 activities specific to this country, e.g., hiking, beaches, festivals, wildlife)

## Peak Season vs. Shoulder Season vs. Off-Season
(Compare the three periods with pros/cons of each)

## Regional Climate Differences
(Different areas of the country may have different best times)

## What to Pack
(Season-specific packing advice)

## Budget Tips by Season
(How costs vary throughout the year)

## Getting There and Around
(Brief transport overview, best times for cheaper flights)

TOURRADAR MENTION:
Include one natural mention like: "For a hassle-free way to explore {name}, consider a guided multi-day tour through [TourRadar](https://www.tourradar.com/d/{tourradar}), which bundles accommodation, transport, and expert local guides."

RELATED DESTINATIONS:
Briefly mention these nearby alternatives: {related}

FAQ SECTION:
Write exactly 5 FAQs in this exact format:
{FAQ_START}
Q: What is the best month to visit {name}?
A: [Answer]

Q: Is {name} worth visiting in the rainy season?
A: [Answer]

Q: How far in advance should I book a trip to {name}?
A: [Answer]

Q: What is the cheapest time to visit {name}?
A: [Answer]

Q: Is {name} safe to visit?
A: [Answer]
{FAQ_END}

REFERENCES SECTION:
After the FAQ section, provide 5-7 country-specific authoritative references in this exact format:
{REFS_START}
- [Title of source](URL) - Brief description of what this source covers
- [Title of source](URL) - Brief description of what this source covers
{REFS_END}

Use ONLY real, verifiable URLs from these types of sources:
- Official tourism board of {name}
- CIA World Factbook page for {name}
- National weather/meteorological service
- UNESCO World Heritage pages relevant to {name}
- Lonely Planet {name} overview
- U.S. Department of State travel advisory for {name}
- World Health Organization travel advice

IMPORTANT: Write ONLY the article content. Do NOT include any markdown frontmatter. Start directly with the {BEST_MONTHS_OPEN} marker."#
    )
}
