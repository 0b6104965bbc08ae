use ledger::models::Scope;

pub const DEMO_PASSWORD: &str = "password123";

pub struct PlanFixture {
    pub name: &'static str,
    pub description: &'static str,
    pub price: &'static str,
    pub features: &'static [&'static str],
}

pub struct CategoryFixture {
    pub name: &'static str,
    pub scope: Scope,
    pub description: &'static str,
    pub icon: &'static str,
}

pub struct SupportCategoryFixture {
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
}

pub struct ArticleFixture {
    pub title: &'static str,
    /// Derived from the title when absent.
    pub slug: Option<&'static str>,
    pub category: &'static str,
    pub content: &'static str,
}

pub const PLANS: [PlanFixture; 3] = [
    PlanFixture {
        name: "Basic",
        description: "Access to CO₂ data, report generation, and settings.",
        price: "0",
        features: &["CO₂ data tracking", "Basic reports", "User settings"],
    },
    PlanFixture {
        name: "Pro",
        description: "Extended features like advanced data visualizations, API integration, report templates, and notifications.",
        price: "49.99",
        features: &[
            "All Basic features",
            "Advanced data visualizations",
            "API integration",
            "Report templates",
            "Notifications",
        ],
    },
    PlanFixture {
        name: "Enterprise",
        description: "Full access to all features, including AI-driven predictions, team management, and custom API integrations.",
        price: "99.99",
        features: &[
            "All Pro features",
            "AI-driven predictions",
            "Team management",
            "Custom API integrations",
            "Dedicated support",
        ],
    },
];

pub const CATEGORIES: [CategoryFixture; 9] = [
    CategoryFixture {
        name: "Electricity",
        scope: Scope::ScopeTwo,
        description: "Electricity consumption",
        icon: "ri-flashlight-line",
    },
    CategoryFixture {
        name: "Natural Gas",
        scope: Scope::ScopeOne,
        description: "Natural gas consumption",
        icon: "ri-fire-line",
    },
    CategoryFixture {
        name: "Fleet Vehicles",
        scope: Scope::ScopeOne,
        description: "Company fleet vehicles",
        icon: "ri-car-line",
    },
    CategoryFixture {
        name: "Heating",
        scope: Scope::ScopeTwo,
        description: "Heating of facilities",
        icon: "ri-home-heat-line",
    },
    CategoryFixture {
        name: "Business Travel",
        scope: Scope::ScopeThree,
        description: "Air travel, hotel stays, etc.",
        icon: "ri-flight-takeoff-line",
    },
    CategoryFixture {
        name: "Purchased Goods",
        scope: Scope::ScopeThree,
        description: "Products and services purchased",
        icon: "ri-shopping-bag-line",
    },
    CategoryFixture {
        name: "Waste Generated",
        scope: Scope::ScopeThree,
        description: "Waste disposal and treatment",
        icon: "ri-delete-bin-line",
    },
    CategoryFixture {
        name: "Employee Commuting",
        scope: Scope::ScopeThree,
        description: "Employee travel to and from work",
        icon: "ri-road-map-line",
    },
    CategoryFixture {
        name: "Other",
        scope: Scope::ScopeOne,
        description: "Other Scope 1 emissions",
        icon: "ri-more-2-line",
    },
];

pub const SUPPORT_CATEGORIES: [SupportCategoryFixture; 5] = [
    SupportCategoryFixture {
        name: "Account",
        description: "Questions related to your account settings and profile",
        icon: "user",
    },
    SupportCategoryFixture {
        name: "Billing",
        description: "Questions about payments, subscriptions, and invoices",
        icon: "credit-card",
    },
    SupportCategoryFixture {
        name: "Technical",
        description: "Technical issues and questions about the platform",
        icon: "code",
    },
    SupportCategoryFixture {
        name: "Data",
        description: "Questions about emissions data and reporting",
        icon: "database",
    },
    SupportCategoryFixture {
        name: "Other",
        description: "Any other questions or issues",
        icon: "help-circle",
    },
];

pub const ARTICLES: [ArticleFixture; 2] = [
    ArticleFixture {
        title: "Getting Started with EcoMetrics",
        slug: Some("getting-started"),
        category: "Technical",
        content: "# Welcome to EcoMetrics

EcoMetrics is your comprehensive solution for tracking, analyzing, and improving your carbon footprint. This guide will help you get started with the platform.

## First Steps

1. **Complete your profile**: Update your user profile and company information
2. **Set up your emissions categories**: Customize the categories that are relevant to your business
3. **Enter initial data**: Begin by entering historical emissions data if available
4. **Generate your first report**: Use the reporting tools to see your baseline emissions

## Key Features

- **Real-time dashboard**: Monitor your emissions with up-to-date visualizations
- **Detailed reporting**: Generate reports for internal use or compliance requirements
- **Collaboration tools**: Invite team members to contribute to your sustainability efforts

Need more help? Contact our support team through the Support Center.",
    },
    ArticleFixture {
        title: "Importing Emissions Data",
        slug: None,
        category: "Data",
        content: "# Importing Your Emissions Data

## Data Requirements

For successful imports, your data should include:

- Date of emission
- Emission category
- Amount of emission
- Unit of measurement (default is tCO2e)
- Source description (optional)

## Common Issues

- **Unrecognized units**: Make sure to use standard units or provide conversion factors
- **Missing dates**: All emissions must have an associated date
- **Category mismatches**: Map your categories to our system categories

For large datasets or custom import needs, please contact our support team.",
    },
];
