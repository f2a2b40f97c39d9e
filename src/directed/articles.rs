use std::collections::HashMap;

/// Articles from visual.ons.gov.uk that were republished on the main site.
const VISUAL_ARTICLES: &[(&str, &str)] = &[(
    "how-long-will-my-pension-need-to-last",
    "https://www.ons.gov.uk/peoplepopulationandcommunity/birthsdeathsandmarriages/lifeexpectancies/articles/howlongwillmypensionneedtolast/2015-03-27",
)];

#[derive(Debug, Default)]
pub struct ArticleRedirectTable(HashMap<String, String>);

impl ArticleRedirectTable {
    pub fn visual() -> Self {
        VISUAL_ARTICLES.iter().copied().collect()
    }

    pub fn get(&self, slug: &str) -> Option<&str> {
        self.0.get(slug).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ArticleRedirectTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(slug, to)| (slug.into(), to.into()))
                .collect(),
        )
    }
}
